use crate::models::Coordinates;

/// Earth's radius in kilometers
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Distance used whenever origin or destination cannot be located
pub const DEFAULT_FALLBACK_DISTANCE_KM: f64 = 200.0;

/// Known place names a student may give as origin
const KNOWN_PLACES: &[(&str, f64, f64)] = &[
    ("Milano", 45.4773, 9.2282),
    ("Bologna", 44.4938, 11.3387),
    ("Roma", 41.8547, 12.6043),
    ("Trento", 46.0664, 11.1257),
    ("Torino", 45.0703, 7.6869),
    ("Firenze", 43.7696, 11.2558),
    ("Pisa", 43.716, 10.3966),
    ("Siena", 43.3188, 11.3308),
    ("Padova", 45.4064, 11.8768),
    ("Venezia", 45.4408, 12.3155),
    ("Verona", 45.4384, 10.9916),
    ("Genova", 44.4056, 8.9463),
    ("Pavia", 45.1847, 9.1582),
    ("Bari", 41.1171, 16.8719),
    ("Lecce", 40.352, 18.169),
    ("Napoli", 40.8518, 14.2681),
    ("Salerno", 40.6824, 14.7681),
    ("Catania", 37.5079, 15.083),
    ("Palermo", 38.1157, 13.3615),
    ("Cagliari", 39.2238, 9.1217),
    ("Trieste", 45.6495, 13.7768),
    ("Perugia", 43.1107, 12.3908),
    ("L'Aquila", 42.351, 13.3984),
    ("Teramo", 42.6612, 13.699),
    ("Potenza", 40.6395, 15.8051),
    ("Rende", 39.3579, 16.227),
    ("Catanzaro", 38.905, 16.589),
    ("Reggio Calabria", 38.1113, 15.6473),
    ("Bergamo", 45.6983, 9.6773),
    ("Brescia", 45.5416, 10.2118),
    ("Bolzano", 46.4983, 11.3548),
    ("Udine", 46.0626, 13.2349),
    ("Ferrara", 44.8381, 11.6198),
    ("Modena", 44.646, 10.9252),
    ("Parma", 44.8015, 10.3279),
    ("Ancona", 43.6158, 13.5189),
    ("Urbino", 43.7262, 12.6366),
    ("Macerata", 43.2991, 13.453),
    ("Camerino", 43.1372, 13.068),
    ("Cassino", 41.4925, 13.8281),
    ("Viterbo", 42.4207, 12.1077),
    ("Campobasso", 41.56, 14.659),
    ("Benevento", 41.129, 14.782),
    ("Foggia", 41.4622, 15.5446),
    ("Messina", 38.1938, 15.554),
    ("Sassari", 40.7275, 8.559),
    ("Enna", 37.5667, 14.2833),
    ("Aversa", 40.9722, 14.2077),
    ("Novedrate", 45.72, 9.116),
    ("Rozzano", 45.382, 9.16),
    ("Castellanza", 45.613, 8.897),
    ("Bra (Pollenzo)", 44.694, 7.935),
];

/// Calculate the Haversine distance between two points in kilometers
///
/// # Arguments
/// * `lat1` - Latitude of first point in degrees
/// * `lon1` - Longitude of first point in degrees
/// * `lat2` - Latitude of second point in degrees
/// * `lon2` - Longitude of second point in degrees
///
/// # Returns
/// Distance in kilometers
#[inline]
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Look up a known place by name (case-insensitive, surrounding whitespace ignored)
pub fn lookup_place(name: &str) -> Option<Coordinates> {
    let name = name.trim();
    KNOWN_PLACES
        .iter()
        .find(|(place, _, _)| place.eq_ignore_ascii_case(name))
        .map(|&(_, lat, lon)| Coordinates { lat, lon })
}

/// Distance in km from a student's origin to a program's city
///
/// Same city name means zero distance. When the origin is missing or not a
/// known place, or the program has no coordinates, `fallback_km` is returned.
pub fn origin_distance(
    origin: Option<&str>,
    city: &str,
    destination: Option<Coordinates>,
    fallback_km: f64,
) -> f64 {
    let origin = match origin.map(str::trim).filter(|o| !o.is_empty()) {
        Some(origin) => origin,
        None => return fallback_km,
    };

    if origin.eq_ignore_ascii_case(city.trim()) {
        return 0.0;
    }

    match (lookup_place(origin), destination) {
        (Some(from), Some(to)) => haversine_distance(from.lat, from.lon, to.lat, to.lon),
        _ => fallback_km,
    }
}

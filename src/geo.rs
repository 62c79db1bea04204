/// Approximate centroid of a Kerala district
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistrictCoordinate {
    pub name: &'static str,
    pub lat: f64,
    pub lon: f64,
}

const fn coord(name: &'static str, lat: f64, lon: f64) -> DistrictCoordinate {
    DistrictCoordinate { name, lat, lon }
}

/// The 14 districts that can be placed on the map. Names must match the
/// `district` column exactly; anything else is left off the map.
pub const DISTRICT_COORDS: [DistrictCoordinate; 14] = [
    coord("Thiruvananthapuram", 8.5241, 76.9366),
    coord("Kollam", 8.8932, 76.6141),
    coord("Pathanamthitta", 9.2643, 76.7878),
    coord("Alappuzha", 9.4981, 76.3388),
    coord("Kottayam", 9.5916, 76.5226),
    coord("Idukki", 9.8786, 77.1596),
    coord("Ernakulam", 9.9816, 76.2999),
    coord("Thrissur", 10.5276, 76.2144),
    coord("Palakkad", 10.7867, 76.6548),
    coord("Malappuram", 11.0738, 76.0800),
    coord("Kozhikode", 11.2588, 75.7804),
    coord("Wayanad", 11.6850, 76.1380),
    coord("Kannur", 11.8745, 75.3704),
    coord("Kasaragode", 12.5000, 74.9900),
];

/// Initial map center (lon, lat)
pub const MAP_CENTER: (f64, f64) = (76.3, 10.5);

/// Coordinate of a district by exact name
pub fn lookup(name: &str) -> Option<&'static DistrictCoordinate> {
    DISTRICT_COORDS.iter().find(|c| c.name == name)
}

/// Bounding box of all known districts as (min_lon, min_lat, max_lon, max_lat)
pub fn district_bounds() -> (f64, f64, f64, f64) {
    DISTRICT_COORDS.iter().fold(
        (f64::MAX, f64::MAX, f64::MIN, f64::MIN),
        |(min_lon, min_lat, max_lon, max_lat), c| {
            (
                min_lon.min(c.lon),
                min_lat.min(c.lat),
                max_lon.max(c.lon),
                max_lat.max(c.lat),
            )
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_exact() {
        assert_eq!(lookup("Idukki").map(|c| c.lat), Some(9.8786));
        assert!(lookup("idukki").is_none());
        assert!(lookup("Kasargod").is_none());
    }

    #[test]
    fn test_bounds_cover_all_districts() {
        let (min_lon, min_lat, max_lon, max_lat) = district_bounds();
        assert_eq!(min_lat, 8.5241);
        assert_eq!(max_lat, 12.5);
        assert_eq!(min_lon, 74.99);
        assert_eq!(max_lon, 77.1596);
    }
}

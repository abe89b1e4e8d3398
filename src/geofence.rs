use crate::error::ApiError;
use crate::model::outlet::Outlet;

/// Mean Earth radius in meters.
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance between two GPS coordinates in meters (Haversine).
pub fn distance_meters(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}

/// Checks that `(lat, lng)` falls inside the outlet's geofence. On violation
/// the error carries the rounded distance, outlet name and radius; the caller
/// must refuse the clock-in/out entirely.
pub fn check_within_radius(lat: f64, lng: f64, outlet: &Outlet) -> Result<f64, ApiError> {
    let distance = distance_meters(lat, lng, outlet.latitude, outlet.longitude);

    if distance > outlet.radius as f64 {
        return Err(ApiError::OutOfRange {
            distance: distance.round() as i64,
            outlet: outlet.name.clone(),
            radius: outlet.radius,
        });
    }

    Ok(distance)
}

/// Picks the nearest outlet whose own radius covers the point. Ties are
/// broken by strict `<`, so the first outlet encountered wins an exact tie.
/// Returns `None` when no outlet is in range; that is not an error — the
/// clock-in proceeds without an outlet.
pub fn nearest_in_range(lat: f64, lng: f64, outlets: &[Outlet]) -> Option<(&Outlet, f64)> {
    let mut nearest: Option<(&Outlet, f64)> = None;

    for outlet in outlets {
        let distance = distance_meters(lat, lng, outlet.latitude, outlet.longitude);
        if distance <= outlet.radius as f64 {
            match nearest {
                Some((_, best)) if distance >= best => {}
                _ => nearest = Some((outlet, distance)),
            }
        }
    }

    nearest
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outlet(name: &str, lat: f64, lng: f64, radius: i64) -> Outlet {
        Outlet {
            id: name.to_lowercase(),
            name: name.to_string(),
            address: None,
            latitude: lat,
            longitude: lng,
            radius,
            daily_rate: 0.0,
            work_start_time: "09:00".into(),
            work_end_time: "17:00".into(),
            is_active: true,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    // Jakarta city center, used as an anchor in most cases below.
    const LAT: f64 = -6.2088;
    const LNG: f64 = 106.8456;

    #[test]
    fn distance_is_zero_for_identical_points() {
        assert!(distance_meters(LAT, LNG, LAT, LNG).abs() < 1e-6);
    }

    #[test]
    fn distance_is_symmetric() {
        let d1 = distance_meters(LAT, LNG, -6.3000, 106.9000);
        let d2 = distance_meters(-6.3000, 106.9000, LAT, LNG);
        assert!((d1 - d2).abs() < 1e-9);
    }

    #[test]
    fn one_millidegree_of_latitude_is_about_111_meters() {
        let d = distance_meters(LAT, LNG, LAT + 0.001, LNG);
        assert!((d - 111.2).abs() < 1.0, "got {d}");
    }

    #[test]
    fn inside_radius_passes_and_reports_distance() {
        let o = outlet("HQ", LAT, LNG, 100);
        // ~55m north
        let d = check_within_radius(LAT + 0.0005, LNG, &o).unwrap();
        assert!(d > 50.0 && d < 60.0);
    }

    #[test]
    fn outside_radius_is_a_policy_violation_with_measurements() {
        let o = outlet("HQ", LAT, LNG, 100);
        // ~155m north
        let err = check_within_radius(LAT + 0.0014, LNG, &o).unwrap_err();
        match err {
            ApiError::OutOfRange {
                distance,
                outlet,
                radius,
            } => {
                assert!(distance > radius, "distance {distance} radius {radius}");
                assert_eq!(outlet, "HQ");
                assert_eq!(radius, 100);
            }
            other => panic!("expected OutOfRange, got {other:?}"),
        }
    }

    #[test]
    fn nearest_in_range_prefers_the_closer_outlet() {
        let near = outlet("Near", LAT + 0.0003, LNG, 200);
        let far = outlet("Far", LAT + 0.0010, LNG, 200);
        let outlets = vec![far, near];

        let (winner, _) = nearest_in_range(LAT, LNG, &outlets).unwrap();
        assert_eq!(winner.name, "Near");
    }

    #[test]
    fn exact_tie_keeps_the_first_outlet() {
        let a = outlet("A", LAT + 0.0005, LNG, 200);
        let b = outlet("B", LAT + 0.0005, LNG, 200);
        let outlets = vec![a, b];

        let (winner, _) = nearest_in_range(LAT, LNG, &outlets).unwrap();
        assert_eq!(winner.name, "A");
    }

    #[test]
    fn out_of_all_radii_matches_nothing() {
        let o = outlet("HQ", LAT, LNG, 50);
        assert!(nearest_in_range(LAT + 0.01, LNG, &[o]).is_none());
    }
}

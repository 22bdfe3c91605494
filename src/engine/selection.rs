use crate::engine::eligibility::EligibleDriver;
use crate::error::AppError;

/// Substituted when a delivery's weight is missing or invalid.
pub const DEFAULT_DEMAND_WEIGHT: f64 = 25.0;

pub fn effective_weight(weight: Option<f64>) -> f64 {
    match weight {
        Some(w) if w.is_finite() && w > 0.0 => w,
        _ => DEFAULT_DEMAND_WEIGHT,
    }
}

/// Greedy largest-capacity-first selection of a driver subset able to
/// cover both the total demand weight and the total stop count.
///
/// Drivers are committed in the order the cumulative scan visits them
/// (capacity descending, input order on ties) and the result is not
/// minimized afterwards. Pure function of its inputs. Either threshold
/// left uncovered after exhausting every eligible driver is a capacity
/// failure.
pub fn select_drivers(
    eligible: &[EligibleDriver],
    demand_weights: &[f64],
) -> Result<Vec<EligibleDriver>, AppError> {
    let total_load: f64 = demand_weights.iter().sum();
    let demand_count = demand_weights.len();

    let mut ranked: Vec<&EligibleDriver> = eligible.iter().collect();
    // Stable sort: equal capacities keep input order, so identical
    // inputs always produce identical selections.
    ranked.sort_by(|a, b| b.vehicle.capacity.total_cmp(&a.vehicle.capacity));

    let mut capacity_covered = 0.0;
    let mut total_stop_capacity = 0usize;
    let mut selected = Vec::new();

    for candidate in ranked {
        selected.push(candidate.clone());
        capacity_covered += candidate.vehicle.capacity;
        total_stop_capacity += candidate.vehicle.vehicle_type.stop_ceiling();

        if capacity_covered >= total_load && total_stop_capacity >= demand_count {
            break;
        }
    }

    if capacity_covered < total_load {
        return Err(AppError::Capacity(
            "insufficient total vehicle capacity to cover all deliveries".to_string(),
        ));
    }

    if total_stop_capacity < demand_count {
        return Err(AppError::Capacity(
            "insufficient stop capacity: too many deliveries for the available vehicles"
                .to_string(),
        ));
    }

    Ok(selected)
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::{effective_weight, select_drivers, DEFAULT_DEMAND_WEIGHT};
    use crate::engine::eligibility::EligibleDriver;
    use crate::error::AppError;
    use crate::models::driver::{Driver, DriverStatus};
    use crate::models::vehicle::{Vehicle, VehicleStatus, VehicleType};

    fn candidate(seed: u128, vehicle_type: VehicleType, capacity: f64) -> EligibleDriver {
        let driver_id = Uuid::from_u128(seed);
        let vehicle_id = Uuid::from_u128(seed + 1000);
        EligibleDriver {
            driver: Driver {
                id: driver_id,
                name: format!("driver {seed}"),
                phone: None,
                vehicle_id: Some(vehicle_id),
                route_ids: vec![],
                status: DriverStatus::Free,
                verified: true,
            },
            vehicle: Vehicle {
                id: vehicle_id,
                vehicle_number: format!("MH-{seed}"),
                vehicle_type,
                capacity,
                status: VehicleStatus::Free,
                assigned_to: Some(driver_id),
            },
        }
    }

    fn fleet() -> Vec<EligibleDriver> {
        vec![
            candidate(1, VehicleType::Van, 500.0),
            candidate(2, VehicleType::Van, 300.0),
            candidate(3, VehicleType::Bike, 200.0),
        ]
    }

    #[test]
    fn single_largest_vehicle_covers_light_demand() {
        // 6 stops totalling 450: the 500-capacity van alone clears both
        // thresholds (500 >= 450, 25 >= 6).
        let demands = vec![100.0, 100.0, 100.0, 50.0, 50.0, 50.0];
        let selected = select_drivers(&fleet(), &demands).unwrap();

        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].vehicle.capacity, 500.0);
    }

    #[test]
    fn greedy_accumulates_until_both_thresholds_hold() {
        // Weight 850: 500 < 850, 500+300 = 800 < 850, 500+300+200 = 1000
        // covers it, and stops 25+25+15 = 65 >= 6.
        let demands = vec![200.0, 200.0, 150.0, 150.0, 100.0, 50.0];
        let selected = select_drivers(&fleet(), &demands).unwrap();

        assert_eq!(selected.len(), 3);
        let capacities: Vec<f64> = selected.iter().map(|c| c.vehicle.capacity).collect();
        assert_eq!(capacities, vec![500.0, 300.0, 200.0]);
    }

    #[test]
    fn insufficient_total_capacity_fails() {
        let demands = vec![600.0, 600.0];
        let err = select_drivers(&fleet(), &demands).unwrap_err();

        match err {
            AppError::Capacity(msg) => assert!(msg.contains("vehicle capacity")),
            other => panic!("expected capacity error, got {other:?}"),
        }
    }

    #[test]
    fn insufficient_stop_capacity_fails_even_when_weight_fits() {
        // One bike with enormous payload capacity: 20 one-unit stops
        // exceed its 15-stop ceiling.
        let eligible = vec![candidate(1, VehicleType::Bike, 1000.0)];
        let demands = vec![1.0; 20];
        let err = select_drivers(&eligible, &demands).unwrap_err();

        match err {
            AppError::Capacity(msg) => assert!(msg.contains("stop capacity")),
            other => panic!("expected capacity error, got {other:?}"),
        }
    }

    #[test]
    fn capacity_ties_keep_input_order() {
        let eligible = vec![
            candidate(7, VehicleType::Van, 300.0),
            candidate(8, VehicleType::Van, 300.0),
        ];
        let demands = vec![250.0];

        let first = select_drivers(&eligible, &demands).unwrap();
        let second = select_drivers(&eligible, &demands).unwrap();

        assert_eq!(first.len(), 1);
        assert_eq!(first[0].driver.id, Uuid::from_u128(7));
        assert_eq!(second[0].driver.id, first[0].driver.id);
    }

    #[test]
    fn selection_never_violates_either_inequality() {
        let demands = vec![120.0, 80.0, 310.0, 45.0, 25.0, 25.0, 25.0];
        let selected = select_drivers(&fleet(), &demands).unwrap();

        let total_load: f64 = demands.iter().sum();
        let capacity: f64 = selected.iter().map(|c| c.vehicle.capacity).sum();
        let stops: usize = selected
            .iter()
            .map(|c| c.vehicle.vehicle_type.stop_ceiling())
            .sum();

        assert!(capacity >= total_load);
        assert!(stops >= demands.len());
    }

    #[test]
    fn missing_or_invalid_weights_fall_back_to_default() {
        assert_eq!(effective_weight(None), DEFAULT_DEMAND_WEIGHT);
        assert_eq!(effective_weight(Some(0.0)), DEFAULT_DEMAND_WEIGHT);
        assert_eq!(effective_weight(Some(-3.0)), DEFAULT_DEMAND_WEIGHT);
        assert_eq!(effective_weight(Some(f64::NAN)), DEFAULT_DEMAND_WEIGHT);
        assert_eq!(effective_weight(Some(12.5)), 12.5);
    }
}

use crate::models::{Vehicle, VehicleClass};

/// Demo roster used by the simulator binary.
pub fn demo_fleet() -> Vec<Vehicle> {
    vec![
        Vehicle::new("V-101", "City Courier 1", VehicleClass::LightDelivery),
        Vehicle::new("V-102", "City Courier 2", VehicleClass::LightDelivery),
        Vehicle::new("V-103", "Metro Van 1", VehicleClass::Van),
        Vehicle::new("V-104", "Metro Van 2", VehicleClass::Van),
        Vehicle::new("V-105", "Linehaul 1", VehicleClass::HeavyFreight),
        Vehicle::new("V-106", "Linehaul 2", VehicleClass::HeavyFreight),
    ]
}

/// Typical operating envelope for a vehicle class.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassProfile {
    pub min_speed_kmh: f64,
    pub max_speed_kmh: f64,
    pub min_efficiency: f64,
    pub max_efficiency: f64,
}

impl ClassProfile {
    pub fn for_class(class: VehicleClass) -> Self {
        match class {
            VehicleClass::LightDelivery => ClassProfile {
                min_speed_kmh: 25.0,
                max_speed_kmh: 90.0,
                min_efficiency: 6.0,
                max_efficiency: 9.0,
            },
            VehicleClass::Van => ClassProfile {
                min_speed_kmh: 30.0,
                max_speed_kmh: 100.0,
                min_efficiency: 4.5,
                max_efficiency: 7.5,
            },
            VehicleClass::HeavyFreight => ClassProfile {
                min_speed_kmh: 40.0,
                max_speed_kmh: 105.0,
                min_efficiency: 2.2,
                max_efficiency: 4.5,
            },
        }
    }
}

use crate::listings::domain::Coordinates;

/// UCSB main campus, the walking-distance reference.
pub const UCSB_CAMPUS: Coordinates = Coordinates::new(34.4140, -119.8489);

/// Del Playa Drive from the campus lagoon end west to Camino Majorca.
pub const DEL_PLAYA_DRIVE: [Coordinates; 5] = [
    Coordinates::new(34.4113, -119.8553),
    Coordinates::new(34.4108, -119.8600),
    Coordinates::new(34.4100, -119.8650),
    Coordinates::new(34.4092, -119.8700),
    Coordinates::new(34.4088, -119.8728),
];

pub const WALKING_SPEED_KMH: f64 = 5.0;

/// Distance from the corridor at which the noise score halves.
pub const NOISE_HALF_DISTANCE_M: f64 = 250.0;

pub const MAX_NOISE_SCORE: f64 = 10.0;

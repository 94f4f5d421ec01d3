//! Sample data for the travel panel, stock ticker and alert bar.
//! There is no live source for these yet.

use crate::models::{Stock, TrafficCamera, TravelRoute};

pub const ALERT_MESSAGE: &str = "SPECIAL WEATHER STATEMENT: Heavy rainfall expected across the \
    region this evening. Minor flooding possible in low-lying areas.";

pub fn travel_times() -> Vec<TravelRoute> {
    vec![TravelRoute {
        id: "t2".to_string(),
        name: "DON VALLEY PKWY".to_string(),
        location: "BLOOR STREET".to_string(),
        now_minutes: 25,
        normal_minutes: 15,
    }]
}

pub fn traffic_cameras() -> Vec<TrafficCamera> {
    vec![TrafficCamera {
        id: "cam1".to_string(),
        name: "DOWNTOWN LIVE CAM".to_string(),
        source: "https://www.youtube.com/embed/1-iS7LArMPA?autoplay=1&mute=1&controls=0&modestbranding=1&rel=0".to_string(),
    }]
}

pub fn stocks() -> Vec<Stock> {
    let stock = |id: &str, symbol: &str, price, change| Stock {
        id: id.to_string(),
        symbol: symbol.to_string(),
        price,
        change,
    };
    vec![
        stock("s1", "WSP GLOBAL INC", 264.18, 4.16),
        stock("s2", "PURPOSE SILVER BULLION", 62.94, 4.11),
        stock("s3", "SPROTT INC.", 150.93, 4.08),
        stock("s4", "TV", 1.50, 0.12),
        stock("s5", "RDW", 10.38, -0.21),
        stock("s6", "NIO", 4.88, 0.05),
        stock("s7", "BAC", 54.88, -1.02),
    ]
}

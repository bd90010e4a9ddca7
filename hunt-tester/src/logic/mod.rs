pub mod hunt_tester;
pub mod picker;
pub mod reports;
pub mod seeds;
pub mod tester;

pub use hunt_tester::{DeliveryMode, HuntPlan, HuntSummary, HuntTester};
pub use picker::PickerProfile;
pub use seeds::resolve_seed_inputs;
pub use tester::*;

pub mod dispatch_use_case;
pub mod ports;
pub mod qualify_use_case;

pub use dispatch_use_case::{DispatchReport, DispatchUseCase};
pub use qualify_use_case::{QualifyOutcome, QualifyUseCase};

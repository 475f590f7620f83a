/// Use cases - Application business logic
pub mod scan_machine;

pub use scan_machine::ScanMachineUseCase;

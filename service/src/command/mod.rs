//! [`Command`] definition.

pub mod change_rental_payment_status;
pub mod change_rental_status;
pub mod create_customer;
pub mod create_vehicle;
pub mod report_damage;
pub mod resolve_vehicle_status;
pub mod schedule_maintenance;
pub mod submit_rental;
pub mod update_damage_status;
pub mod update_maintenance_status;
pub mod withdraw_vehicle;

/// [`Command`] of the [`Service`].
///
/// [`Service`]: crate::Service
pub use common::Handler as Command;

pub use self::{
    change_rental_payment_status::ChangeRentalPaymentStatus,
    change_rental_status::ChangeRentalStatus,
    create_customer::CreateCustomer, create_vehicle::CreateVehicle,
    report_damage::ReportDamage, resolve_vehicle_status::ResolveVehicleStatus,
    schedule_maintenance::ScheduleMaintenance, submit_rental::SubmitRental,
    update_damage_status::UpdateDamageStatus,
    update_maintenance_status::UpdateMaintenanceStatus,
    withdraw_vehicle::WithdrawVehicle,
};

//! Fixtures for testing [`Command`]s and [`Query`]s against a [`Memory`]
//! database.

use std::sync::atomic::{AtomicU32, Ordering};

use common::{money::Currency, Date, Money};

#[cfg(doc)]
use crate::Query;
use crate::{
    command::{
        CreateCustomer, CreateVehicle, ReportDamage, ScheduleMaintenance,
        SubmitRental,
    },
    domain::{
        customer, damage, maintenance, rental, vehicle, Customer, Damage,
        Maintenance, Vehicle,
    },
    infra::database::Memory,
    Command, Config, Service,
};

/// Creates a new [`Service`] over an empty [`Memory`] database.
pub(crate) fn service() -> Service<Memory> {
    Service::new(Config::default(), Memory::default())
}

/// Parses the provided `YYYY-MM-DD` string into a [`Date`].
pub(crate) fn date(s: &str) -> Date {
    s.parse().unwrap()
}

/// Creates a new [`Vehicle`] with a unique [`vehicle::PlateNumber`].
pub(crate) async fn vehicle(svc: &Service<Memory>) -> Vehicle {
    static NUM: AtomicU32 = AtomicU32::new(1);

    svc.execute(CreateVehicle {
        plate_number: vehicle::PlateNumber::new(format!(
            "AB-{:04}",
            NUM.fetch_add(1, Ordering::Relaxed),
        ))
        .unwrap(),
        model: vehicle::Model::new("Toyota Corolla").unwrap(),
    })
    .await
    .unwrap()
}

/// Creates a new [`Customer`].
pub(crate) async fn customer(svc: &Service<Memory>) -> Customer {
    svc.execute(CreateCustomer {
        name: customer::Name::new("Jamie Doe").unwrap(),
        license_number: customer::LicenseNumber::new("DL-0042").unwrap(),
        phone: None,
    })
    .await
    .unwrap()
}

/// Schedules a new [`Maintenance`] of the [`Vehicle`] on the provided `day`.
pub(crate) async fn maintenance(
    svc: &Service<Memory>,
    vehicle_id: vehicle::Id,
    day: Date,
) -> Maintenance {
    svc.execute(ScheduleMaintenance {
        vehicle_id,
        service_type: maintenance::ServiceType::new("Oil change").unwrap(),
        description: maintenance::Description::new("5W-30").unwrap(),
        scheduled_date: day.coerce(),
        cost: Money::zero(Currency::Usd),
        provider: Some(maintenance::Provider::new("Quick Lube").unwrap()),
        next_service_due: None,
    })
    .await
    .unwrap()
}

/// Reports a new [`Damage`] of the [`Vehicle`] with the provided
/// [`damage::Severity`].
pub(crate) async fn damage(
    svc: &Service<Memory>,
    vehicle_id: vehicle::Id,
    severity: damage::Severity,
) -> Damage {
    svc.execute(ReportDamage {
        vehicle_id,
        severity,
        description: damage::Description::new("Scratched door").unwrap(),
        images: vec![],
        repair_cost: None,
        insurance_claim: None,
    })
    .await
    .unwrap()
}

/// Creates a new [`SubmitRental`] creating a [`Rental`] without override.
///
/// [`Rental`]: crate::domain::Rental
pub(crate) fn rental(
    customer_id: customer::Id,
    vehicle_id: vehicle::Id,
    start: &str,
    end: &str,
) -> SubmitRental {
    SubmitRental {
        rental_id: None,
        customer_id,
        vehicle_id,
        start_date: date(start),
        end_date: date(end),
        payment_status: rental::PaymentStatus::Pending,
        with_driver: false,
        insurance: true,
        total_amount: "250USD".parse().unwrap(),
        override_conflict: false,
        initiator: None,
    }
}

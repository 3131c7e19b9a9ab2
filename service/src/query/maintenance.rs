//! [`Query`] collection related to [`Maintenance`] records.

use common::{
    operations::{By, Select},
    Period,
};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::Vehicle;
use crate::{
    domain::{maintenance, vehicle, Maintenance},
    infra::{database, Database},
    read, Service,
};

use super::{DatabaseQuery, Query};

/// Queries a [`Maintenance`] by its [`maintenance::Id`].
pub type ById = DatabaseQuery<By<Option<Maintenance>, maintenance::Id>>;

/// Queries all the [`read::Live`] [`Maintenance`] records of a [`Vehicle`].
pub type Live = DatabaseQuery<By<Vec<read::Live<Maintenance>>, vehicle::Id>>;

/// [`Query`] for the live [`Maintenance`] records of a [`Vehicle`] which
/// would collide with the [`Vehicle`] being rented for a [`Period`].
///
/// An unknown [`Vehicle`] has no conflicts.
#[derive(Clone, Copy, Debug)]
pub struct Conflicts {
    /// ID of the [`Vehicle`] to be rented.
    pub vehicle_id: vehicle::Id,

    /// [`Period`] the [`Vehicle`] is to be rented for.
    pub period: Period,
}

impl Conflicts {
    /// Retains the [`Maintenance`] records colliding with this [`Conflicts`]
    /// out of the provided `live` ones, keeping their order.
    #[must_use]
    pub fn among(
        &self,
        live: impl IntoIterator<Item = read::Live<Maintenance>>,
    ) -> Vec<Maintenance> {
        live.into_iter()
            .map(|read::Live(m)| m)
            .filter(|m| {
                m.vehicle_id == self.vehicle_id
                    && m.conflicts_with(&self.period)
            })
            .collect()
    }
}

impl<Db> Query<Conflicts> for Service<Db>
where
    Db: Database<
        Select<By<Vec<read::Live<Maintenance>>, vehicle::Id>>,
        Ok = Vec<read::Live<Maintenance>>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Vec<Maintenance>;
    type Err = Traced<database::Error>;

    async fn execute(&self, query: Conflicts) -> Result<Self::Ok, Self::Err> {
        let live = self
            .database()
            .execute(Select(By::new(query.vehicle_id)))
            .await
            .map_err(tracerr::wrap!())?;
        Ok(query.among(live))
    }
}

#[cfg(test)]
mod spec {
    use common::{Date, DateTime, Money, Period};

    use crate::{
        domain::{
            maintenance::{self, Description, ServiceType, Status},
            vehicle, Maintenance,
        },
        read,
    };

    use super::Conflicts;

    fn date(s: &str) -> Date {
        s.parse().unwrap()
    }

    fn period(start: &str, end: &str) -> Period {
        Period::new(date(start), date(end)).unwrap()
    }

    fn record(
        vehicle_id: vehicle::Id,
        day: &str,
        status: Status,
    ) -> Maintenance {
        Maintenance {
            id: maintenance::Id::new(),
            vehicle_id,
            service_type: ServiceType::new("Oil change").unwrap(),
            description: Description::new("").unwrap(),
            scheduled_date: date(day).coerce(),
            status,
            cost: "120USD".parse::<Money>().unwrap(),
            provider: None,
            next_service_due: None,
            cancellation: None,
            created_at: DateTime::now().coerce(),
        }
    }

    #[test]
    fn retains_exactly_overlapping_live_records() {
        let vehicle_id = vehicle::Id::new();
        let records = [
            record(vehicle_id, "2025-06-07", Status::Scheduled),
            record(vehicle_id, "2025-06-08", Status::Scheduled),
            record(vehicle_id, "2025-06-10", Status::InProgress),
            record(vehicle_id, "2025-06-12", Status::Scheduled),
            record(vehicle_id, "2025-06-13", Status::Scheduled),
            record(vehicle_id, "2025-06-10", Status::Completed),
            record(vehicle_id, "2025-06-10", Status::Cancelled),
            record(vehicle::Id::new(), "2025-06-10", Status::Scheduled),
        ];
        let expected = [records[1].id, records[2].id, records[3].id];

        let conflicts = Conflicts {
            vehicle_id,
            period: period("2025-06-08", "2025-06-12"),
        }
        .among(records.into_iter().map(read::Live));

        assert_eq!(
            conflicts.iter().map(|m| m.id).collect::<Vec<_>>(),
            expected,
        );
    }

    #[test]
    fn single_day_period_touches_boundaries() {
        let vehicle_id = vehicle::Id::new();
        let m = record(vehicle_id, "2025-06-10", Status::Scheduled);

        for (start, end, hit) in [
            ("2025-06-10", "2025-06-10", true),
            ("2025-06-09", "2025-06-10", true),
            ("2025-06-10", "2025-06-11", true),
            ("2025-06-11", "2025-06-20", false),
            ("2025-06-01", "2025-06-09", false),
        ] {
            let found = Conflicts {
                vehicle_id,
                period: period(start, end),
            }
            .among([read::Live(m.clone())]);
            assert_eq!(found.len() == 1, hit, "[{start}, {end}]");
        }
    }
}

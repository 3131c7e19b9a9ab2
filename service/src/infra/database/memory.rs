//! In-memory [`Database`] implementation.
//!
//! Transactions only serialize callers through per-[`Vehicle`] locks: writes
//! are applied immediately and never rolled back, unless an aborting failure
//! is requested via [`Memory::abort_on_rental_write()`].

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};

use common::operations::{By, Commit, Insert, Lock, Select, Transact, Update};
use derive_more::{Display, Error as StdError};
use tokio::sync::OwnedMutexGuard;
use tracerr::Traced;

use crate::{
    domain::{
        customer, damage, maintenance, rental, vehicle, Customer, Damage,
        Maintenance, Rental, Vehicle,
    },
    infra::{database, Database},
    read,
};

/// In-memory [`Database`].
///
/// Clones share the same data. A [`Transact`]ed [`Memory`] holds the locks
/// taken through it until [`Commit`]ted or dropped.
#[derive(Clone, Debug, Default)]
pub struct Memory {
    /// Stored data.
    state: Arc<Mutex<State>>,

    /// Per-[`Vehicle`] locks.
    locks: Arc<Mutex<HashMap<vehicle::Id, Arc<tokio::sync::Mutex<()>>>>>,

    /// Locks held by this transaction.
    held: Arc<Mutex<Vec<OwnedMutexGuard<()>>>>,
}

/// Data stored in a [`Memory`] [`Database`].
#[derive(Debug, Default)]
struct State {
    /// Stored [`Customer`]s.
    customers: HashMap<customer::Id, Customer>,

    /// Stored [`Vehicle`]s.
    vehicles: HashMap<vehicle::Id, Vehicle>,

    /// Stored [`Rental`]s.
    rentals: HashMap<rental::Id, Rental>,

    /// Stored [`Maintenance`] records, in insertion order.
    maintenance: Vec<Maintenance>,

    /// Stored [`Damage`]s, in insertion order.
    damages: Vec<Damage>,

    /// Number of performed writes.
    writes: usize,

    /// Number of writes performed per [`Maintenance`] record.
    maintenance_writes: HashMap<maintenance::Id, usize>,

    /// Indicator whether [`Rental`] writes should fail.
    fail_rental_writes: bool,

    /// Indicator whether a failed [`Rental`] write aborts the transaction.
    abort_on_rental_write: bool,

    /// Indicator whether the transaction is aborted, so any following
    /// [`Maintenance`] write is rejected.
    aborted: bool,

    /// Number of writes rejected because of an aborted transaction.
    rejected_writes: usize,
}

impl Memory {
    /// Locks the [`State`] of this [`Memory`].
    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Returns the total number of writes performed so far.
    pub(crate) fn writes(&self) -> usize {
        self.state().writes
    }

    /// Returns the number of writes performed upon the [`Maintenance`] with
    /// the provided ID.
    pub(crate) fn maintenance_writes(&self, id: maintenance::Id) -> usize {
        self.state()
            .maintenance_writes
            .get(&id)
            .copied()
            .unwrap_or_default()
    }

    /// Makes all the following [`Rental`] writes fail.
    pub(crate) fn fail_rental_writes(&self) {
        self.state().fail_rental_writes = true;
    }

    /// Makes all the following [`Rental`] writes fail, aborting the
    /// transaction the way a transactional store does: any [`Maintenance`]
    /// write after the failure is rejected.
    pub(crate) fn abort_on_rental_write(&self) {
        let mut state = self.state();
        state.fail_rental_writes = true;
        state.abort_on_rental_write = true;
    }

    /// Returns the number of writes rejected because of an aborted
    /// transaction.
    pub(crate) fn rejected_writes(&self) -> usize {
        self.state().rejected_writes
    }

    /// Returns the stored [`Maintenance`] with the provided ID.
    pub(crate) fn maintenance(
        &self,
        id: maintenance::Id,
    ) -> Option<Maintenance> {
        self.state().maintenance.iter().find(|m| m.id == id).cloned()
    }

    /// Returns all the stored [`Rental`]s.
    pub(crate) fn rentals(&self) -> Vec<Rental> {
        self.state().rentals.values().cloned().collect()
    }

    /// Returns the stored [`Vehicle`] with the provided ID.
    pub(crate) fn vehicle(&self, id: vehicle::Id) -> Option<Vehicle> {
        self.state().vehicles.get(&id).cloned()
    }
}

/// [`Memory`] database [`Error`].
///
/// [`Error`]: std::error::Error
#[derive(Clone, Copy, Debug, Display, StdError)]
pub enum Error {
    /// Write was rejected as its transaction is already aborted.
    #[display("transaction is aborted")]
    Aborted,

    /// Write failure was requested.
    #[display("injected write failure")]
    Injected,
}

impl Database<Transact> for Memory {
    type Ok = Self;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        Ok(Self {
            state: Arc::clone(&self.state),
            locks: Arc::clone(&self.locks),
            held: Arc::default(),
        })
    }
}

impl Database<Commit> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Commit) -> Result<Self::Ok, Self::Err> {
        self.held.lock().unwrap_or_else(|e| e.into_inner()).clear();
        Ok(())
    }
}

impl Database<Lock<By<Vehicle, vehicle::Id>>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Vehicle, vehicle::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let lock = Arc::clone(
            self.locks
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .entry(by.into_inner())
                .or_default(),
        );
        let guard = lock.lock_owned().await;
        self.held
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(guard);
        Ok(())
    }
}

impl Database<Select<By<Option<Customer>, customer::Id>>> for Memory {
    type Ok = Option<Customer>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Customer>, customer::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        tokio::task::yield_now().await;
        Ok(self.state().customers.get(&by.into_inner()).cloned())
    }
}

impl Database<Insert<Customer>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(customer): Insert<Customer>,
    ) -> Result<Self::Ok, Self::Err> {
        let mut state = self.state();
        state.writes += 1;
        _ = state.customers.insert(customer.id, customer);
        Ok(())
    }
}

impl Database<Select<By<Option<Vehicle>, vehicle::Id>>> for Memory {
    type Ok = Option<Vehicle>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Vehicle>, vehicle::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        tokio::task::yield_now().await;
        Ok(self.state().vehicles.get(&by.into_inner()).cloned())
    }
}

impl Database<Select<By<Option<Vehicle>, vehicle::PlateNumber>>> for Memory {
    type Ok = Option<Vehicle>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Vehicle>, vehicle::PlateNumber>>,
    ) -> Result<Self::Ok, Self::Err> {
        let plate_number = by.into_inner();
        Ok(self
            .state()
            .vehicles
            .values()
            .find(|v| v.plate_number == plate_number)
            .cloned())
    }
}

impl Database<Insert<Vehicle>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(vehicle): Insert<Vehicle>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(vehicle)).await
    }
}

impl Database<Update<Vehicle>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(vehicle): Update<Vehicle>,
    ) -> Result<Self::Ok, Self::Err> {
        let mut state = self.state();
        state.writes += 1;
        _ = state.vehicles.insert(vehicle.id, vehicle);
        Ok(())
    }
}

impl Database<Select<By<read::vehicle::IsRented, vehicle::Id>>> for Memory {
    type Ok = read::vehicle::IsRented;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<read::vehicle::IsRented, vehicle::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let vehicle_id = by.into_inner();
        Ok(read::vehicle::IsRented(
            self.state()
                .rentals
                .values()
                .any(|r| r.vehicle_id == vehicle_id && r.is_active()),
        ))
    }
}

impl Database<Select<By<Option<Rental>, rental::Id>>> for Memory {
    type Ok = Option<Rental>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Rental>, rental::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        tokio::task::yield_now().await;
        Ok(self.state().rentals.get(&by.into_inner()).cloned())
    }
}

impl Database<Select<By<Vec<read::Live<Rental>>, vehicle::Id>>> for Memory {
    type Ok = Vec<read::Live<Rental>>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<read::Live<Rental>>, vehicle::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        tokio::task::yield_now().await;
        let vehicle_id = by.into_inner();
        let mut live = self
            .state()
            .rentals
            .values()
            .filter(|r| r.vehicle_id == vehicle_id && r.is_live())
            .cloned()
            .collect::<Vec<_>>();
        live.sort_by_key(|r| r.period.start());
        Ok(live.into_iter().map(read::Live).collect())
    }
}

impl Database<Insert<Rental>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(rental): Insert<Rental>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(rental)).await
    }
}

impl Database<Update<Rental>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(rental): Update<Rental>,
    ) -> Result<Self::Ok, Self::Err> {
        tokio::task::yield_now().await;
        let mut state = self.state();
        if state.fail_rental_writes {
            state.aborted = state.abort_on_rental_write;
            return Err(tracerr::new!(database::Error::from(Error::Injected)));
        }
        state.writes += 1;
        _ = state.rentals.insert(rental.id, rental);
        Ok(())
    }
}

impl Database<Select<By<Option<Maintenance>, maintenance::Id>>> for Memory {
    type Ok = Option<Maintenance>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Maintenance>, maintenance::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self.maintenance(by.into_inner()))
    }
}

impl Database<Select<By<Vec<read::Live<Maintenance>>, vehicle::Id>>>
    for Memory
{
    type Ok = Vec<read::Live<Maintenance>>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<read::Live<Maintenance>>, vehicle::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        tokio::task::yield_now().await;
        let vehicle_id = by.into_inner();
        let mut live = self
            .state()
            .maintenance
            .iter()
            .filter(|m| m.vehicle_id == vehicle_id && m.is_live())
            .cloned()
            .collect::<Vec<_>>();
        live.sort_by_key(|m| m.scheduled_date);
        Ok(live.into_iter().map(read::Live).collect())
    }
}

impl Database<Insert<Maintenance>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(maintenance): Insert<Maintenance>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(maintenance)).await
    }
}

impl Database<Update<Maintenance>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(maintenance): Update<Maintenance>,
    ) -> Result<Self::Ok, Self::Err> {
        tokio::task::yield_now().await;
        let mut state = self.state();
        if state.aborted {
            state.rejected_writes += 1;
            return Err(tracerr::new!(database::Error::from(Error::Aborted)));
        }
        state.writes += 1;
        *state.maintenance_writes.entry(maintenance.id).or_default() += 1;
        if let Some(m) =
            state.maintenance.iter_mut().find(|m| m.id == maintenance.id)
        {
            *m = maintenance;
        } else {
            state.maintenance.push(maintenance);
        }
        Ok(())
    }
}

impl Database<Select<By<Option<Damage>, damage::Id>>> for Memory {
    type Ok = Option<Damage>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Damage>, damage::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self.state().damages.iter().find(|d| d.id == id).cloned())
    }
}

impl Database<Select<By<Vec<read::Live<Damage>>, vehicle::Id>>> for Memory {
    type Ok = Vec<read::Live<Damage>>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<read::Live<Damage>>, vehicle::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        tokio::task::yield_now().await;
        let vehicle_id = by.into_inner();
        Ok(self
            .state()
            .damages
            .iter()
            .filter(|d| d.vehicle_id == vehicle_id && d.is_live())
            .cloned()
            .map(read::Live)
            .collect())
    }
}

impl Database<Insert<Damage>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(damage): Insert<Damage>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(damage)).await
    }
}

impl Database<Update<Damage>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(damage): Update<Damage>,
    ) -> Result<Self::Ok, Self::Err> {
        let mut state = self.state();
        state.writes += 1;
        if let Some(d) = state.damages.iter_mut().find(|d| d.id == damage.id) {
            *d = damage;
        } else {
            state.damages.push(damage);
        }
        Ok(())
    }
}

//! Sample position domain and data generators for tests and benchmarks
//!
//! Positions reference an account (and through it a counterparty) and a security.
//! Foreign-key ids are derived once when the related object is attached, so an item
//! never carries an id that disagrees with the object it points at.

use crate::engine::DynamicIndex;
use crate::error::{IndexError, IndexResult};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use std::time::Instant;
use tracing::debug;

/// Seed used by the reference data generator
pub const DEFAULT_SEED: u64 = 3_897_234;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterParty {
    pub id: i64,
    pub counter_party_type_id: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Account {
    pub id: i64,
    pub counter_party: CounterParty,
    pub counter_party_id: i64,
}

impl Account {
    pub fn new(id: i64, counter_party: CounterParty) -> Self {
        Self { id, counter_party, counter_party_id: counter_party.id }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Security {
    pub id: i64,
    pub security_type_id: i64,
    pub currency_id: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub id: i64,
    pub account: Account,
    pub account_id: i64,
    pub security: Security,
    pub security_id: i64,
}

impl Position {
    pub fn new(id: i64, account: Account, security: Security) -> Self {
        Self { id, account, account_id: account.id, security, security_id: security.id }
    }
}

/// Query over positions; `None` leaves a field unfiltered
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PositionQuery {
    pub account_id: Option<i64>,
    pub counter_party_id: Option<i64>,
    pub counter_party_type_id: Option<i64>,
    pub security_id: Option<i64>,
    pub security_type_id: Option<i64>,
    pub currency_id: Option<i64>,
}

/// Cardinalities for generated datasets
#[derive(Debug, Clone)]
pub struct FixtureConfig {
    pub positions: usize,
    pub securities: usize,
    pub accounts: usize,
    pub counter_parties: usize,
    /// Type ids are drawn from `0..=counter_party_types`
    pub counter_party_types: i64,
    /// Type ids are drawn from `0..=security_types`
    pub security_types: i64,
    /// Currency ids are drawn from `0..=currencies`
    pub currencies: i64,
}

impl FixtureConfig {
    /// 10 positions, 5 accounts, 3 counterparties, 10 securities
    pub fn small() -> Self {
        Self {
            positions: 10,
            securities: 10,
            accounts: 5,
            counter_parties: 3,
            counter_party_types: 10,
            security_types: 10,
            currencies: 10,
        }
    }

    pub fn large() -> Self {
        Self {
            positions: 750_000,
            securities: 50_000,
            accounts: 10_000,
            counter_parties: 5_000,
            counter_party_types: 25,
            security_types: 10,
            currencies: 50,
        }
    }

    /// Accounts, securities and counterparties must be non-empty to draw from
    pub fn validate(&self) -> IndexResult<()> {
        for (setting, count) in [
            ("accounts", self.accounts),
            ("securities", self.securities),
            ("counter_parties", self.counter_parties),
        ] {
            if count == 0 {
                return Err(IndexError::configuration(
                    setting,
                    format!("fixture needs at least one entry in {setting}"),
                ));
            }
        }
        Ok(())
    }
}

/// Seeded generator producing the same dataset for the same seed and config
pub struct FixtureGenerator {
    rng: StdRng,
}

impl FixtureGenerator {
    pub fn new(seed: u64) -> Self {
        Self { rng: StdRng::seed_from_u64(seed) }
    }

    /// Generate positions; ids are sequential from zero within each entity type
    pub fn positions(&mut self, config: &FixtureConfig) -> IndexResult<Vec<Position>> {
        config.validate()?;
        let started = Instant::now();

        let counter_parties: Vec<CounterParty> = (0..config.counter_parties)
            .map(|id| CounterParty {
                id: id as i64,
                counter_party_type_id: self.rng.random_range(0..=config.counter_party_types),
            })
            .collect();

        let accounts: Vec<Account> = (0..config.accounts)
            .map(|id| {
                let counter_party = *pick(&mut self.rng, &counter_parties, "counter_parties")?;
                Ok(Account::new(id as i64, counter_party))
            })
            .collect::<IndexResult<_>>()?;

        let securities: Vec<Security> = (0..config.securities)
            .map(|id| Security {
                id: id as i64,
                security_type_id: self.rng.random_range(0..=config.security_types),
                currency_id: self.rng.random_range(0..=config.currencies),
            })
            .collect();

        let positions: Vec<Position> = (0..config.positions)
            .map(|id| {
                let security = *pick(&mut self.rng, &securities, "securities")?;
                let account = *pick(&mut self.rng, &accounts, "accounts")?;
                Ok(Position::new(id as i64, account, security))
            })
            .collect::<IndexResult<_>>()?;

        debug!(
            positions = positions.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Generated position fixture"
        );

        Ok(positions)
    }
}

impl Default for FixtureGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_SEED)
    }
}

fn pick<'a, T>(rng: &mut StdRng, items: &'a [T], table: &str) -> IndexResult<&'a T> {
    items
        .choose(rng)
        .ok_or_else(|| IndexError::configuration(table, "cannot pick from an empty fixture table"))
}

/// Fixed ten-position dataset with known query results
///
/// Counterparty 2 holds seven positions (0, 2, 3, 5, 6, 7, 9); three of those
/// (0, 2, 5) are in securities of type 3.
pub fn reference_positions() -> Vec<Position> {
    let counter_parties = [
        CounterParty { id: 0, counter_party_type_id: 4 },
        CounterParty { id: 1, counter_party_type_id: 7 },
        CounterParty { id: 2, counter_party_type_id: 1 },
    ];

    let accounts = [
        Account::new(0, counter_parties[2]),
        Account::new(1, counter_parties[0]),
        Account::new(2, counter_parties[2]),
        Account::new(3, counter_parties[1]),
        Account::new(4, counter_parties[2]),
    ];

    let security_types = [3, 5, 3, 0, 8, 3, 1, 9, 2, 6];
    let currencies = [5, 2, 5, 1, 0, 2, 7, 3, 4, 5];
    let securities: Vec<Security> = (0..10)
        .map(|id| Security {
            id: id as i64,
            security_type_id: security_types[id],
            currency_id: currencies[id],
        })
        .collect();

    let holdings = [(0, 0), (1, 1), (2, 2), (4, 3), (3, 4), (0, 5), (2, 6), (4, 7), (1, 8), (0, 9)];

    holdings
        .iter()
        .enumerate()
        .map(|(id, &(account, security))| {
            Position::new(id as i64, accounts[account], securities[security])
        })
        .collect()
}

/// Build a position index with every query field registered
pub fn position_index(positions: Vec<Position>) -> IndexResult<DynamicIndex<Position, PositionQuery>> {
    let mut index = DynamicIndex::new(positions, |p: &Position| p.id)?;
    register_position_fields(&mut index)?;
    Ok(index)
}

/// Register the standard position fields in their canonical order
pub fn register_position_fields(
    index: &mut DynamicIndex<Position, PositionQuery>,
) -> IndexResult<()> {
    index.setup_query("account_id", |q| q.account_id, |p| p.account.id)?;
    index.setup_query("counter_party_id", |q| q.counter_party_id, |p| p.account.counter_party.id)?;
    index.setup_query(
        "counter_party_type_id",
        |q| q.counter_party_type_id,
        |p| p.account.counter_party.counter_party_type_id,
    )?;
    index.setup_query("security_id", |q| q.security_id, |p| p.security.id)?;
    index.setup_query("security_type_id", |q| q.security_type_id, |p| p.security.security_type_id)?;
    index.setup_query("currency_id", |q| q.currency_id, |p| p.security.currency_id)?;
    Ok(())
}

/// Install a `tracing` subscriber honouring `RUST_LOG`; safe to call repeatedly
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generator_is_deterministic() {
        let config = FixtureConfig::small();
        let first = FixtureGenerator::new(7).positions(&config).unwrap();
        let second = FixtureGenerator::new(7).positions(&config).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.len(), 10);
    }

    #[test]
    fn test_foreign_keys_derived_at_construction() {
        for position in FixtureGenerator::default().positions(&FixtureConfig::small()).unwrap() {
            assert_eq!(position.account_id, position.account.id);
            assert_eq!(position.security_id, position.security.id);
            assert_eq!(position.account.counter_party_id, position.account.counter_party.id);
        }
    }

    #[test]
    fn test_empty_tables_are_rejected() {
        let config = FixtureConfig { accounts: 0, ..FixtureConfig::small() };
        let err = FixtureGenerator::default().positions(&config).unwrap_err();
        assert_eq!(
            err,
            IndexError::Configuration {
                message: "fixture needs at least one entry in accounts".to_string(),
                setting: Some("accounts".to_string()),
            }
        );

        let config = FixtureConfig { positions: 0, securities: 0, ..FixtureConfig::small() };
        assert!(FixtureGenerator::default().positions(&config).is_err());
    }

    #[test]
    fn test_reference_fixture_shape() {
        let positions = reference_positions();
        assert_eq!(positions.len(), 10);
        let cp2 = positions.iter().filter(|p| p.account.counter_party_id == 2).count();
        assert_eq!(cp2, 7);
    }
}

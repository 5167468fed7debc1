//! Name registry for words zones.
//!
//! Maps the IP address of a client to a name made of words, e.g.
//! `correct-horse-battery.words.example.com`, and back.
//!
//! The candidate names for an address are given by its [part sequence][crate::allocator], so an
//! address is always offered the same names in the same order. Registration walks the candidates
//! and settles on the first slot that is free or already holds the address, which makes
//! [`NameRegistry::assign_or_confirm`] idempotent without any index besides the slots
//! themselves.
//!
//! Slots are claimed with the store's atomic create-if-absent. A registration that loses a race
//! for a slot re-reads it and moves on. Slots with content that isn't an IP address are
//! reclaimed, one registration at a time per zone.

use crate::allocator::part_sequence;
use crate::error::Error;
use crate::slot_store::DynSlotStore;
use crate::word_table::WordTable;
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use trust_dns_server::client::rr::LowerName;

pub mod access;

pub use access::Registrar;

/// Re-reads of a single slot before treating it as taken. A slot only flips between free and
/// taken more than once when it is being removed by hand.
const MAX_SLOT_ATTEMPTS: usize = 3;

/// `SharedRegistry` is the [`NameRegistry`] shared by the DNS responders and the HTTP API.
pub type SharedRegistry = Arc<NameRegistry>;

/// The name space of one words zone.
#[derive(Debug)]
struct ZoneNames {
    dir: String,
    words: Arc<WordTable>,
    arity: u32,
    reclaim: Mutex<()>,
}

#[derive(Debug, PartialEq, Eq)]
enum Claim {
    Assigned,
    Confirmed,
    Taken,
}

/// Registered names of every words zone, persisted in a
/// [`SlotStore`][crate::slot_store::SlotStore].
pub struct NameRegistry {
    zones: HashMap<LowerName, ZoneNames>,
    store: DynSlotStore,
}

/// Directory name of a zone in the slot store: the zone without its trailing dot.
#[must_use]
pub fn zone_dir(zone: &LowerName) -> String {
    zone.to_string().trim_end_matches('.').to_string()
}

/// Parse the content of a slot.
///
/// # Errors
///
/// Returns [`Error::CorruptSlot`] if the content isn't an IP address.
pub fn parse_slot_content(name: &str, content: &str) -> Result<IpAddr, Error> {
    content.trim().parse().map_err(|_| Error::CorruptSlot {
        name: name.to_string(),
        content: content.to_string(),
    })
}

impl NameRegistry {
    #[must_use]
    pub fn new(store: DynSlotStore) -> Self {
        NameRegistry {
            zones: HashMap::default(),
            store,
        }
    }

    /// Add a zone whose names are `arity` words from `words`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateZone`] if the zone was already added, and
    /// [`Error::DegenerateNameSpace`] or [`Error::NameSpaceOverflow`] if the word table and
    /// arity don't make a usable name space.
    pub fn add_zone(
        &mut self,
        zone: LowerName,
        words: Arc<WordTable>,
        arity: u32,
    ) -> Result<(), Error> {
        let space = crate::allocator::name_space(arity, words.len())?;
        if self.zones.contains_key(&zone) {
            return Err(Error::DuplicateZone(zone));
        }
        debug!("registry zone {zone}: {arity} word(s) of {}, {space} names", words.len());
        self.zones.insert(
            zone.clone(),
            ZoneNames {
                dir: zone_dir(&zone),
                words,
                arity,
                reclaim: Mutex::new(()),
            },
        );
        Ok(())
    }

    #[must_use]
    pub fn has_zone(&self, zone: &LowerName) -> bool {
        self.zones.contains_key(zone)
    }

    fn zone(&self, zone: &LowerName) -> Result<&ZoneNames, Error> {
        self.zones
            .get(zone)
            .ok_or_else(|| Error::UnknownZone(zone.clone()))
    }

    /// Return the name registered for `ip` in `zone`, registering the first free candidate name
    /// if there is none yet.
    ///
    /// Callers should go through [`Registrar::register`], which checks that `ip` may register
    /// in `zone` at all.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownZone`] for zones that weren't added, [`Error::ZoneFull`] if every
    /// candidate name belongs to another address, and IO errors from the store.
    pub async fn assign_or_confirm(&self, zone: &LowerName, ip: IpAddr) -> Result<String, Error> {
        let names = self.zone(zone)?;
        let key = ip.to_string();
        for digits in part_sequence(key.as_bytes(), names.arity, names.words.len())? {
            let slot = digits.into();
            let words = names.words.words(&slot);
            let name = names.words.name(&slot);
            match self.claim(names, &words, &name, ip).await? {
                Claim::Assigned => {
                    info!("assigned \"{name}\" in {zone} to {ip}");
                    return Ok(name);
                }
                Claim::Confirmed => {
                    debug!("confirmed \"{name}\" in {zone} for {ip}");
                    return Ok(name);
                }
                Claim::Taken => {}
            }
        }
        Err(Error::ZoneFull(zone.clone()))
    }

    async fn claim(
        &self,
        names: &ZoneNames,
        words: &[&str],
        name: &str,
        ip: IpAddr,
    ) -> Result<Claim, Error> {
        for _ in 0..MAX_SLOT_ATTEMPTS {
            let content = match self.store.read_slot(&names.dir, words).await? {
                None => {
                    if self
                        .store
                        .create_slot(&names.dir, words, &ip.to_string())
                        .await?
                    {
                        return Ok(Claim::Assigned);
                    }
                    // Lost the race for this slot, see who won.
                    continue;
                }
                Some(content) => content,
            };
            match parse_slot_content(name, &content) {
                Ok(owner) if owner == ip => return Ok(Claim::Confirmed),
                Ok(_) => return Ok(Claim::Taken),
                Err(err) => {
                    warn!("reclaiming slot in {}: {err}", names.dir);
                    self.reclaim(names, words, name).await?;
                }
            }
        }
        Ok(Claim::Taken)
    }

    /// Free a corrupt slot so it can be claimed again. Re-checks the slot under the zone's
    /// reclaim lock, so a slot is only freed while it still holds invalid content.
    async fn reclaim(&self, names: &ZoneNames, words: &[&str], name: &str) -> Result<(), Error> {
        let _guard = names.reclaim.lock().await;
        if let Some(content) = self.store.read_slot(&names.dir, words).await? {
            if parse_slot_content(name, &content).is_err() {
                self.store.remove_slot(&names.dir, words).await?;
            }
        }
        Ok(())
    }

    /// Return the IP address registered for `name` in `zone`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownZone`] for zones that weren't added, [`Error::NotRegistered`] if
    /// `name` isn't a name of the zone, is free, or holds invalid content, and IO errors from
    /// the store.
    pub async fn lookup(&self, zone: &LowerName, name: &str) -> Result<IpAddr, Error> {
        let names = self.zone(zone)?;
        let slot = names
            .words
            .key_for_name(name, names.arity)
            .ok_or_else(|| Error::NotRegistered(name.to_string()))?;
        let words = names.words.words(&slot);
        let content = self
            .store
            .read_slot(&names.dir, &words)
            .await?
            .ok_or_else(|| Error::NotRegistered(name.to_string()))?;
        parse_slot_content(name, &content).map_err(|err| {
            debug!("lookup in {zone}: {err}");
            Error::NotRegistered(name.to_string())
        })
    }
}

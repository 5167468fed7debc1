use crate::error::Error;
use crate::registry::{NameRegistry, Registrar};
use crate::slot_store::{DynSlotStore, FileSlotStore, InMemorySlotStore};
use crate::word_table::WordTable;
use ipnetwork::IpNetwork;
use serde::Deserialize;
use serde_with::{serde_as, DurationSeconds};
use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufReader, Read};
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use trust_dns_server::client::rr::{LowerName, Name};

pub type Shared = Arc<Config>;

const WORD_LIST_FILE: &str = "word_list";

#[serde_as]
#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    /// Root of the registry's slot tree. Registrations are kept in memory when absent.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    /// Word list for words zones that don't name their own. Defaults to
    /// `<data_dir>/word_list`.
    #[serde(default)]
    pub word_list: Option<PathBuf>,
    /// Served as the HTTP API index page.
    #[serde(default)]
    pub readme_path: Option<PathBuf>,
    pub api_bind_addr: SocketAddr,
    #[serde_as(as = "DurationSeconds<u64>")]
    pub api_timeout: Duration,
    pub dns_udp_bind_addr: SocketAddr,
    pub dns_tcp_bind_addr: SocketAddr,
    #[serde_as(as = "DurationSeconds<u64>")]
    pub dns_tcp_timeout: Duration,
    pub zones: Vec<ZoneConfig>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ZoneConfig {
    pub domain: LowerName,
    pub ns_domain: LowerName,
    /// Zone admin mailbox for the SOA record, e.g. `dns-admin@example.com`. Defaults to
    /// `hostmaster@<domain>`.
    #[serde(default)]
    pub ns_admin: Option<String>,
    /// Extra addresses served at the zone apex.
    #[serde(default)]
    pub addrs: Vec<IpAddr>,
    #[serde(flatten)]
    pub kind: ZoneKind,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ZoneKind {
    Echo,
    Words {
        #[serde(default = "default_arity")]
        arity: u32,
        subnet: IpNetwork,
        #[serde(default)]
        word_list: Option<PathBuf>,
    },
}

fn default_arity() -> u32 {
    3
}

/// `name` as a fully qualified name.
#[must_use]
pub fn fqdn(name: &LowerName) -> LowerName {
    let mut name: Name = name.into();
    name.set_fqdn(true);
    LowerName::from(name)
}

impl ZoneConfig {
    #[must_use]
    pub fn fqdn(&self) -> LowerName {
        fqdn(&self.domain)
    }

    #[must_use]
    pub fn ns_fqdn(&self) -> LowerName {
        fqdn(&self.ns_domain)
    }

    pub fn ns_admin(&self) -> Result<Name, Error> {
        let mut name = Name::from_str(&self.sanitized_ns_admin())?;
        name.set_fqdn(true);
        Ok(name)
    }

    fn sanitized_ns_admin(&self) -> Cow<str> {
        let Some(ns_admin) = &self.ns_admin else {
            let domain = self.domain.to_string();
            return Cow::Owned(format!("hostmaster.{}", domain.trim_end_matches('.')));
        };
        match ns_admin.split_once('@') {
            Some((user, domain)) => {
                let user = user.replace('.', "\\.");
                Cow::Owned(format!("{user}.{domain}"))
            }
            _ => Cow::Borrowed(ns_admin),
        }
    }
}

impl Config {
    pub fn try_from_file(p: impl AsRef<Path>) -> Result<Self, Error> {
        let f = File::open(p)?;
        Self::try_from_reader(BufReader::new(f))
    }

    pub fn try_from_reader(reader: impl Read) -> Result<Self, Error> {
        let conf: Config = serde_json::from_reader(reader)?;
        conf.zones_are_unique()?;
        Ok(conf)
    }

    fn zones_are_unique(&self) -> Result<(), Error> {
        let mut seen = HashSet::new();
        for zone in &self.zones {
            if !seen.insert(zone.fqdn()) {
                return Err(Error::DuplicateZone(zone.fqdn()));
            }
        }
        Ok(())
    }

    fn words_zones(
        &self,
    ) -> impl Iterator<Item = (&ZoneConfig, u32, &IpNetwork, Option<&PathBuf>)> {
        self.zones.iter().filter_map(|zone| match &zone.kind {
            ZoneKind::Words {
                arity,
                subnet,
                word_list,
            } => Some((zone, *arity, subnet, word_list.as_ref())),
            ZoneKind::Echo => None,
        })
    }

    #[must_use]
    pub fn has_words_zones(&self) -> bool {
        self.words_zones().next().is_some()
    }

    fn word_list_path(
        &self,
        zone: &ZoneConfig,
        word_list: Option<&PathBuf>,
    ) -> Result<PathBuf, Error> {
        word_list
            .or(self.word_list.as_ref())
            .cloned()
            .or_else(|| self.data_dir.as_ref().map(|d| d.join(WORD_LIST_FILE)))
            .ok_or_else(|| Error::MissingWordList(zone.fqdn()))
    }

    /// Open the slot store for the configured `data_dir`, or an in-memory store without one.
    pub async fn slot_store(&self) -> Result<DynSlotStore, Error> {
        match &self.data_dir {
            Some(dir) => Ok(Arc::new(FileSlotStore::try_from_dir(dir).await?)),
            None => {
                tracing::warn!("no data_dir configured, registrations will be lost on restart");
                Ok(Arc::new(InMemorySlotStore::default()))
            }
        }
    }

    /// Build the name registry of every words zone, loading each distinct word list once.
    pub async fn name_registry(&self, store: DynSlotStore) -> Result<NameRegistry, Error> {
        let mut registry = NameRegistry::new(store);
        let mut tables: HashMap<PathBuf, Arc<WordTable>> = HashMap::new();
        for (zone, arity, subnet, word_list) in self.words_zones() {
            let path = self.word_list_path(zone, word_list)?;
            let words = match tables.get(&path) {
                Some(words) => words.clone(),
                None => {
                    let words = Arc::new(WordTable::try_from_file(&path).await?);
                    tables.insert(path.clone(), words.clone());
                    words
                }
            };
            tracing::debug!(
                "registered zone {} | {subnet} | {} word(s) from {}",
                zone.fqdn(),
                words.len(),
                path.display()
            );
            registry.add_zone(zone.fqdn(), words, arity)?;
        }
        Ok(registry)
    }

    /// A [`Registrar`] for every words zone, filtering on the zone's subnet.
    #[must_use]
    pub fn registrar(&self, registry: crate::registry::SharedRegistry) -> Registrar {
        let subnets = self
            .words_zones()
            .map(|(zone, _, subnet, _)| (zone.fqdn(), *subnet))
            .collect();
        Registrar::new(registry, subnets)
    }
}

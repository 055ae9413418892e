//! Stockage des données dans des fichiers JSON plats, un tableau par type d'entité.
//!
//! Chaque opération relit le fichier complet et le réécrit en entier. Un verrou
//! en mémoire garantit un seul écrivain à la fois dans le processus; il n'existe
//! aucun verrouillage entre processus (le dernier écrivain gagne).

pub mod analytics;
pub mod appointment;
pub mod health_record;
pub mod hospital;
pub mod medication;
pub mod prescription;
pub mod profile;
pub mod reminder;
pub mod support;
pub mod user;

use std::{
    collections::HashMap,
    fs::{self, create_dir_all, File},
    io::{self, ErrorKind::NotFound},
    path::{Path, PathBuf},
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use chrono::{Local, NaiveDate, NaiveDateTime};
use log::{info, warn};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;

use crate::consts;

/// Une entité stockée comme élément d'un tableau JSON.
pub trait Record: Serialize + DeserializeOwned + Clone {
    /// Nom du fichier contenant le tableau, relatif au dossier de données
    const FILE: &'static str;

    fn id(&self) -> u64;
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Unexpected content in {path}: {source}")]
    Schema {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to serialize {path}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("DB poisoned")]
    Poisoned,
}

/// Compteurs d'identifiants, indexés par nom de fichier
type IdCounters = HashMap<String, u64>;

/// Un élément de tableau. Ce qui ne correspond pas au type attendu est conservé
/// tel quel et réécrit à l'identique.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum Slot<T> {
    Known(T),
    Foreign(serde_json::Value),
}

impl<T: Record> Slot<T> {
    fn known(&self) -> Option<&T> {
        match self {
            Slot::Known(record) => Some(record),
            Slot::Foreign(_) => None,
        }
    }

    fn known_mut(&mut self) -> Option<&mut T> {
        match self {
            Slot::Known(record) => Some(record),
            Slot::Foreign(_) => None,
        }
    }

    fn id(&self) -> Option<u64> {
        match self {
            Slot::Known(record) => Some(record.id()),
            Slot::Foreign(value) => value.get("id").and_then(serde_json::Value::as_u64),
        }
    }
}

/// Le dossier de données et le verrou d'écriture du processus
pub struct Store {
    root: PathBuf,
    lock: RwLock<()>,
}

/// Le contenu d'un fichier de tableau, chargé pour une lecture-modification-écriture.
pub struct Table<T> {
    slots: Vec<Slot<T>>,
    next_id: u64,
    allocated: bool,
    dirty: bool,
}

impl<T: Record> Table<T> {
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.slots.iter().filter_map(Slot::known)
    }

    /// Réserve un nouvel identifiant. Les identifiants ne sont jamais réutilisés.
    pub fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.allocated = true;
        id
    }

    pub fn push(&mut self, record: T) {
        self.slots.push(Slot::Known(record));
        self.dirty = true;
    }

    pub fn get_mut(&mut self, id: u64) -> Option<&mut T> {
        let found = self
            .slots
            .iter_mut()
            .filter_map(Slot::known_mut)
            .find(|r| r.id() == id);
        if found.is_some() {
            self.dirty = true;
        }
        found
    }

    pub fn find_mut(&mut self, predicate: impl Fn(&T) -> bool) -> Option<&mut T> {
        let found = self
            .slots
            .iter_mut()
            .filter_map(Slot::known_mut)
            .find(|r| predicate(r));
        if found.is_some() {
            self.dirty = true;
        }
        found
    }

    /// Retire les enregistrements ne satisfaisant pas le prédicat, sans changer l'ordre des autres
    pub fn retain(&mut self, keep: impl Fn(&T) -> bool) -> usize {
        let before = self.slots.len();
        self.slots.retain(|slot| slot.known().map_or(true, |r| keep(r)));
        self.dirty = true;
        before - self.slots.len()
    }
}

impl Store {
    /// Ouvre le dossier de données, en créant les fichiers manquants
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        create_dir_all(&root).map_err(|source| StoreError::Io {
            path: root.clone(),
            source,
        })?;

        let store = Self {
            root,
            lock: RwLock::new(()),
        };

        for file in [
            consts::USERS_FILE,
            consts::APPOINTMENTS_FILE,
            consts::PRESCRIPTIONS_FILE,
            consts::HEALTH_RECORDS_FILE,
            consts::REMINDERS_FILE,
            consts::MEDICATIONS_FILE,
            consts::SAVED_HOSPITALS_FILE,
            consts::SUPPORT_TICKETS_FILE,
            consts::HEALTH_PROFILES_FILE,
        ] {
            let path = store.path(file);
            if !path.exists() {
                info!("Creating empty data file {}", path.display());
                store.save_json(file, &Vec::<serde_json::Value>::new())?;
            }
        }

        if !store.path(consts::ANALYTICS_FILE).exists() {
            store.save_json(consts::ANALYTICS_FILE, &analytics::Analytics::default())?;
        }

        Ok(store)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path(&self, file: &str) -> PathBuf {
        self.root.join(file)
    }

    fn read_guard(&self) -> Result<RwLockReadGuard<'_, ()>, StoreError> {
        self.lock.read().or(Err(StoreError::Poisoned))
    }

    fn write_guard(&self) -> Result<RwLockWriteGuard<'_, ()>, StoreError> {
        self.lock.write().or(Err(StoreError::Poisoned))
    }

    /// Charge un fichier JSON. Un fichier absent, vide ou qui n'est pas du JSON vaut
    /// la valeur par défaut. Du JSON valide d'une autre forme est une erreur: le
    /// fichier ne doit pas être réécrit.
    fn load_json<D: DeserializeOwned + Default>(&self, file: &str) -> Result<D, StoreError> {
        let path = self.path(file);
        match fs::read(&path) {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(value) => Ok(value),
                Err(source) if source.is_data() => Err(StoreError::Schema { path, source }),
                Err(e) => {
                    warn!("Unreadable data file {}: {}", path.display(), e);
                    Ok(D::default())
                }
            },
            Err(not_found) if not_found.kind() == NotFound => Ok(D::default()),
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }

    fn load_slots<T: Record>(&self) -> Result<Vec<Slot<T>>, StoreError> {
        let slots: Vec<Slot<T>> = self.load_json(T::FILE)?;
        let foreign = slots.iter().filter(|s| s.known().is_none()).count();
        if foreign > 0 {
            warn!("{} unrecognised record(s) kept as is in {}", foreign, T::FILE);
        }
        Ok(slots)
    }

    /// Réécrit entièrement un fichier JSON
    fn save_json<D: Serialize>(&self, file: &str, value: &D) -> Result<(), StoreError> {
        let path = self.path(file);
        let handle = File::create(&path).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        serde_json::to_writer_pretty(handle, value)
            .map_err(|source| StoreError::Serialize { path, source })
    }

    /// Lit tous les enregistrements d'un type, dans l'ordre d'insertion
    pub fn all<T: Record>(&self) -> Result<Vec<T>, StoreError> {
        let _guard = self.read_guard()?;
        let slots = self.load_slots::<T>()?;
        Ok(slots
            .into_iter()
            .filter_map(|slot| match slot {
                Slot::Known(record) => Some(record),
                Slot::Foreign(_) => None,
            })
            .collect())
    }

    pub fn filter<T: Record>(&self, predicate: impl Fn(&T) -> bool) -> Result<Vec<T>, StoreError> {
        Ok(self.all::<T>()?.into_iter().filter(|r| predicate(r)).collect())
    }

    pub fn find<T: Record>(&self, id: u64) -> Result<Option<T>, StoreError> {
        Ok(self.all::<T>()?.into_iter().find(|r| r.id() == id))
    }

    /// Lecture-modification-écriture d'un tableau complet sous le verrou d'écriture.
    pub fn transact<T: Record, R>(
        &self,
        operation: impl FnOnce(&mut Table<T>) -> R,
    ) -> Result<R, StoreError> {
        let _guard = self.write_guard()?;

        let slots = self.load_slots::<T>()?;
        let mut counters: IdCounters = self.load_json(consts::ID_COUNTERS_FILE)?;

        let after_max = slots.iter().filter_map(Slot::id).max().unwrap_or(0) + 1;
        let counter = counters.get(T::FILE).copied().unwrap_or(1);

        let mut table = Table {
            slots,
            next_id: counter.max(after_max),
            allocated: false,
            dirty: false,
        };

        let result = operation(&mut table);

        if table.dirty {
            self.save_json(T::FILE, &table.slots)?;
        }
        if table.allocated {
            counters.insert(T::FILE.to_string(), table.next_id);
            self.save_json(consts::ID_COUNTERS_FILE, &counters)?;
        }

        Ok(result)
    }

    /// Ajoute un enregistrement construit à partir de son nouvel identifiant
    pub fn insert<T: Record>(&self, build: impl FnOnce(u64) -> T) -> Result<T, StoreError> {
        self.transact(|table: &mut Table<T>| {
            let record = build(table.allocate_id());
            table.push(record.clone());
            record
        })
    }

    /// Modifie l'enregistrement portant cet identifiant, s'il existe
    pub fn update<T: Record>(
        &self,
        id: u64,
        apply: impl FnOnce(&mut T),
    ) -> Result<Option<T>, StoreError> {
        self.transact(|table: &mut Table<T>| {
            table.get_mut(id).map(|record| {
                apply(record);
                record.clone()
            })
        })
    }

    /// Supprime l'enregistrement portant cet identifiant. Retourne s'il existait.
    pub fn delete<T: Record>(&self, id: u64) -> Result<bool, StoreError> {
        self.transact(|table: &mut Table<T>| table.retain(|r| r.id() != id) > 0)
    }

    /// Lecture-modification-écriture d'un document JSON unique (pas un tableau)
    pub(crate) fn modify_document<D, R>(
        &self,
        file: &str,
        operation: impl FnOnce(&mut D) -> R,
    ) -> Result<R, StoreError>
    where
        D: Serialize + DeserializeOwned + Default,
    {
        let _guard = self.write_guard()?;
        let mut document: D = self.load_json(file)?;
        let result = operation(&mut document);
        self.save_json(file, &document)?;
        Ok(result)
    }

    pub(crate) fn read_document<D>(&self, file: &str) -> Result<D, StoreError>
    where
        D: DeserializeOwned + Default,
    {
        let _guard = self.read_guard()?;
        self.load_json(file)
    }
}

/// Filtre insensible à la casse par sous-chaîne. Un filtre vide laisse tout passer.
pub fn matches_filter(filter: Option<&str>, fields: &[&str]) -> bool {
    match filter.map(str::trim) {
        None | Some("") => true,
        Some(needle) => {
            let needle = needle.to_lowercase();
            fields.iter().any(|f| f.to_lowercase().contains(&needle))
        }
    }
}

pub(crate) fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

pub(crate) fn today() -> NaiveDate {
    Local::now().date_naive()
}

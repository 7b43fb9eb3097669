//! Which feed file loads into which table, and in what column order.
#![forbid(unsafe_code)]

use std::collections::HashSet;
use std::fmt;
use std::io::{self, BufReader};

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use transitload_core::{LoadJob, LoadJobError};

/// The entities a feed is made of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// Transit operators.
    Agency,
    /// Service exceptions by date.
    CalendarDate,
    /// Named routes run by an agency.
    Route,
    /// Boarding locations.
    Stop,
    /// Individual journeys along a route.
    Trip,
    /// Points tracing the path of a trip.
    Shape,
    /// Arrival and departure times of a trip at a stop.
    StopTime,
}

impl EntityKind {
    /// Every entity, parents before the entities that reference them.
    pub const ALL: [Self; 7] = [
        Self::Agency,
        Self::CalendarDate,
        Self::Route,
        Self::Stop,
        Self::Trip,
        Self::Shape,
        Self::StopTime,
    ];

    /// Destination table.
    #[must_use]
    pub const fn table_name(self) -> &'static str {
        match self {
            Self::Agency => "agency",
            Self::CalendarDate => "calendar_date",
            Self::Route => "route",
            Self::Stop => "stop",
            Self::Trip => "trip",
            Self::Shape => "shape",
            Self::StopTime => "stop_time",
        }
    }

    /// Conventional file name inside a feed directory.
    #[must_use]
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Agency => "agency.txt",
            Self::CalendarDate => "calendar_dates.txt",
            Self::Route => "routes.txt",
            Self::Stop => "stops.txt",
            Self::Trip => "trips.txt",
            Self::Shape => "shapes.txt",
            Self::StopTime => "stop_times.txt",
        }
    }

    /// Table columns in the field order of the conventional file.
    #[must_use]
    pub const fn columns(self) -> &'static [&'static str] {
        match self {
            Self::Agency => &[
                "agency_id",
                "agency_name",
                "agency_url",
                "agency_timezone",
                "agency_lang",
                "agency_phone",
            ],
            Self::CalendarDate => &["service_id", "date", "exception_type"],
            Self::Route => &[
                "route_id",
                "agency_id",
                "route_short_name",
                "route_long_name",
                "route_type",
                "route_url",
                "route_color",
            ],
            Self::Stop => &[
                "stop_id",
                "stop_code",
                "stop_name",
                "stop_desc",
                "stop_lat",
                "stop_lon",
                "zone_id",
            ],
            Self::Trip => &[
                "route_id",
                "service_id",
                "trip_id",
                "trip_headsign",
                "direction_id",
                "block_id",
                "shape_id",
            ],
            Self::Shape => &[
                "shape_id",
                "shape_pt_lat",
                "shape_pt_lon",
                "shape_pt_sequence",
                "shape_dist_traveled",
            ],
            Self::StopTime => &[
                "trip_id",
                "arrival_time",
                "departure_time",
                "stop_id",
                "stop_sequence",
                "pickup_type",
                "drop_off_type",
                "shape_dist_traveled",
            ],
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_name())
    }
}

/// Source file and field order for one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EntityLayout {
    /// Entity the file holds.
    pub kind: EntityKind,
    /// File name relative to the feed directory.
    pub file_name: String,
    /// Columns in the order their fields appear on each line.
    pub columns: Vec<String>,
}

impl EntityLayout {
    /// Conventional layout for `kind`.
    #[must_use]
    pub fn conventional(kind: EntityKind) -> Self {
        Self {
            kind,
            file_name: kind.file_name().to_owned(),
            columns: kind.columns().iter().map(|&c| c.to_owned()).collect(),
        }
    }
}

/// Errors raised while reading or validating a [`FeedLayout`].
#[derive(Debug, Error)]
pub enum FeedLayoutError {
    /// The layout file could not be read.
    #[error("failed to read feed layout {path}: {source}")]
    Read {
        /// Layout file.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The layout file is not valid JSON for a layout.
    #[error("failed to parse feed layout {path}: {source}")]
    Parse {
        /// Layout file.
        path: Utf8PathBuf,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
    /// The layout lists no entities.
    #[error("feed layout lists no entities")]
    Empty,
    /// An entity appears more than once.
    #[error("entity {kind} appears more than once in the feed layout")]
    DuplicateEntity {
        /// Repeated entity.
        kind: EntityKind,
    },
    /// An entity has a blank file name.
    #[error("entity {kind} has no file name")]
    EmptyFileName {
        /// Offending entity.
        kind: EntityKind,
    },
    /// A column is not part of the entity's table.
    #[error("table {kind} has no column named {column}")]
    UnknownColumn {
        /// Offending entity.
        kind: EntityKind,
        /// Unknown column.
        column: String,
    },
    /// The entity cannot be turned into a load job.
    #[error("invalid load job for {kind}: {source}")]
    Job {
        /// Offending entity.
        kind: EntityKind,
        /// Validation failure.
        #[source]
        source: LoadJobError,
    },
}

/// Ordered description of every file in a feed.
///
/// Jobs run in layout order, so parents should come before the entities that
/// reference them.
///
/// # Examples
///
/// ```
/// use camino::Utf8Path;
/// use transitload_feed::FeedLayout;
///
/// # fn main() -> Result<(), transitload_feed::FeedLayoutError> {
/// let jobs = FeedLayout::default().jobs(Utf8Path::new("feeds/njt"))?;
/// assert_eq!(jobs[0].table_name(), "agency");
/// assert_eq!(jobs[0].source_path(), Utf8Path::new("feeds/njt/agency.txt"));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "LayoutFile", into = "LayoutFile")]
pub struct FeedLayout {
    entities: Vec<EntityLayout>,
}

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct LayoutFile {
    entities: Vec<EntityLayout>,
}

impl TryFrom<LayoutFile> for FeedLayout {
    type Error = FeedLayoutError;

    fn try_from(file: LayoutFile) -> Result<Self, Self::Error> {
        Self::new(file.entities)
    }
}

impl From<FeedLayout> for LayoutFile {
    fn from(layout: FeedLayout) -> Self {
        Self {
            entities: layout.entities,
        }
    }
}

impl Default for FeedLayout {
    fn default() -> Self {
        Self {
            entities: EntityKind::ALL
                .into_iter()
                .map(EntityLayout::conventional)
                .collect(),
        }
    }
}

impl FeedLayout {
    /// Validate and build a layout.
    pub fn new(entities: Vec<EntityLayout>) -> Result<Self, FeedLayoutError> {
        if entities.is_empty() {
            return Err(FeedLayoutError::Empty);
        }
        let mut seen = HashSet::with_capacity(entities.len());
        for entity in &entities {
            validate_entity(entity)?;
            if !seen.insert(entity.kind) {
                return Err(FeedLayoutError::DuplicateEntity { kind: entity.kind });
            }
        }
        Ok(Self { entities })
    }

    /// Read a JSON layout file.
    pub fn from_json_path(path: &Utf8Path) -> Result<Self, FeedLayoutError> {
        let file = transitload_fs::open_utf8_file(path).map_err(|source| FeedLayoutError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_reader(BufReader::new(file)).map_err(|source| {
            // Validation failures surface through serde as custom errors.
            FeedLayoutError::Parse {
                path: path.to_path_buf(),
                source,
            }
        })
    }

    /// Entities in load order.
    #[must_use]
    pub fn entities(&self) -> &[EntityLayout] {
        &self.entities
    }

    /// Build one load job per entity, resolving file names against
    /// `feed_dir`.
    pub fn jobs(&self, feed_dir: &Utf8Path) -> Result<Vec<LoadJob>, FeedLayoutError> {
        self.entities
            .iter()
            .map(|entity| {
                LoadJob::new(
                    feed_dir.join(&entity.file_name),
                    entity.kind.table_name(),
                    entity.columns.iter().cloned(),
                )
                .map_err(|source| FeedLayoutError::Job {
                    kind: entity.kind,
                    source,
                })
            })
            .collect()
    }
}

fn validate_entity(entity: &EntityLayout) -> Result<(), FeedLayoutError> {
    if entity.file_name.trim().is_empty() {
        return Err(FeedLayoutError::EmptyFileName { kind: entity.kind });
    }
    let known = entity.kind.columns();
    if let Some(column) = entity
        .columns
        .iter()
        .find(|column| !known.contains(&column.as_str()))
    {
        return Err(FeedLayoutError::UnknownColumn {
            kind: entity.kind,
            column: column.clone(),
        });
    }
    LoadJob::new(
        entity.file_name.as_str(),
        entity.kind.table_name(),
        entity.columns.iter().cloned(),
    )
    .map(|_| ())
    .map_err(|source| FeedLayoutError::Job {
        kind: entity.kind,
        source,
    })
}

//! Problem-file parsing.
//!
//! Problem instances are JSON documents listing jig types, jigs, flights
//! (belugas), racks, production lines, and the trailer/hangar slot pools.
//! Jig names carry a 1-based sequential id (`jig0001`, `jig0002`, …);
//! everything past this module is 0-based.
//!
//! A malformed or missing file is a hard error: loading happens once,
//! before any search, and nothing downstream can cope with a partial
//! state.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::jig::{Jig, JigId, JigType, TypeId};
use crate::state::{Beluga, ProblemState, ProductionLine, Rack};

/// Errors raised while loading a problem file.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read problem file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse problem file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown jig type `{0}`")]
    UnknownJigType(String),

    #[error("malformed jig name `{0}` (expected `jigNNNN` with a 1-based id)")]
    BadJigName(String),

    #[error("jig `{0}` is referenced but not defined")]
    UnknownJig(String),

    #[error("jig names do not form a contiguous 1-based sequence")]
    BadJigSequence,
}

#[derive(Debug, Deserialize)]
struct ProblemFile {
    /// Older instance files omit the table and rely on the standard types.
    #[serde(default)]
    jig_types: BTreeMap<String, JigTypeSpec>,
    jigs: BTreeMap<String, JigSpec>,
    flights: Vec<FlightSpec>,
    racks: Vec<RackSpec>,
    production_lines: Vec<ProductionLineSpec>,
    trailers_beluga: Vec<serde_json::Value>,
    trailers_factory: Vec<serde_json::Value>,
    hangars: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct JigTypeSpec {
    size_empty: u32,
    size_loaded: u32,
}

#[derive(Debug, Deserialize)]
struct JigSpec {
    #[serde(rename = "type")]
    jig_type: String,
    empty: bool,
}

#[derive(Debug, Deserialize)]
struct FlightSpec {
    incoming: Vec<String>,
    outgoing: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RackSpec {
    size: u32,
    jigs: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ProductionLineSpec {
    schedule: Vec<String>,
}

/// The standard jig-type table used when an instance file carries none.
fn default_jig_types() -> Vec<JigType> {
    vec![
        JigType::new("typeA", 4, 4),
        JigType::new("typeB", 8, 11),
        JigType::new("typeC", 9, 18),
        JigType::new("typeD", 18, 25),
        JigType::new("typeE", 32, 32),
    ]
}

/// Load a problem instance from a JSON file.
pub fn load(path: impl AsRef<Path>) -> Result<ProblemState, LoadError> {
    let contents = std::fs::read_to_string(path.as_ref())?;
    let state = load_from_str(&contents)?;
    info!(
        path = %path.as_ref().display(),
        jigs = state.jigs().len(),
        belugas = state.belugas().len(),
        racks = state.racks().len(),
        production_lines = state.production_lines().len(),
        "loaded problem instance"
    );
    Ok(state)
}

/// Load a problem instance from in-memory JSON.
pub fn load_from_str(contents: &str) -> Result<ProblemState, LoadError> {
    let file: ProblemFile = serde_json::from_str(contents)?;

    let jig_types: Vec<JigType> = if file.jig_types.is_empty() {
        default_jig_types()
    } else {
        file.jig_types
            .into_iter()
            .map(|(name, spec)| JigType::new(name, spec.size_empty, spec.size_loaded))
            .collect()
    };
    let type_by_name: BTreeMap<&str, TypeId> = jig_types
        .iter()
        .enumerate()
        .map(|(i, ty)| (ty.name.as_str(), TypeId(i)))
        .collect();
    let resolve_type = |name: &str| {
        type_by_name
            .get(name)
            .copied()
            .ok_or_else(|| LoadError::UnknownJigType(name.to_string()))
    };

    // Jig names carry their id; the map order is irrelevant.
    let jig_count = file.jigs.len();
    let mut jigs: Vec<Option<Jig>> = vec![None; jig_count];
    for (name, spec) in &file.jigs {
        let id = parse_jig_id(name)?;
        if id.0 >= jig_count || jigs[id.0].is_some() {
            return Err(LoadError::BadJigSequence);
        }
        jigs[id.0] = Some(Jig::new(resolve_type(&spec.jig_type)?, spec.empty));
    }
    let jigs: Vec<Jig> = jigs.into_iter().flatten().collect();
    if jigs.len() != jig_count {
        return Err(LoadError::BadJigSequence);
    }
    let resolve_jig = |name: &str| -> Result<JigId, LoadError> {
        let id = parse_jig_id(name)?;
        if id.0 >= jig_count {
            return Err(LoadError::UnknownJig(name.to_string()));
        }
        Ok(id)
    };

    let belugas = file
        .flights
        .iter()
        .map(|flight| {
            let incoming = flight
                .incoming
                .iter()
                .map(|name| resolve_jig(name))
                .collect::<Result<Vec<_>, _>>()?;
            let outgoing = flight
                .outgoing
                .iter()
                .map(|name| resolve_type(name))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Beluga::new(incoming, outgoing))
        })
        .collect::<Result<Vec<_>, LoadError>>()?;

    let racks = file
        .racks
        .iter()
        .map(|rack| {
            let residents = rack
                .jigs
                .iter()
                .map(|name| resolve_jig(name))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Rack::new(rack.size, residents))
        })
        .collect::<Result<Vec<_>, LoadError>>()?;

    let production_lines = file
        .production_lines
        .iter()
        .map(|line| {
            let schedule = line
                .schedule
                .iter()
                .map(|name| resolve_jig(name))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(ProductionLine::new(schedule))
        })
        .collect::<Result<Vec<_>, LoadError>>()?;

    Ok(ProblemState::new(
        jig_types,
        jigs,
        belugas,
        vec![None; file.trailers_beluga.len()],
        vec![None; file.trailers_factory.len()],
        racks,
        production_lines,
        vec![None; file.hangars.len()],
    ))
}

/// `jig0007` → `JigId(6)`. Ids in files are 1-based; internal ids are not.
fn parse_jig_id(name: &str) -> Result<JigId, LoadError> {
    let digits = name
        .strip_prefix("jig")
        .ok_or_else(|| LoadError::BadJigName(name.to_string()))?;
    let id: usize = digits
        .parse()
        .map_err(|_| LoadError::BadJigName(name.to_string()))?;
    if id == 0 {
        return Err(LoadError::BadJigName(name.to_string()));
    }
    Ok(JigId(id - 1))
}

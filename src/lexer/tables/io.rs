// src/lexer/tables/io.rs
use std::{
    io::{BufWriter, Write},
    path::Path,
    time::Instant,
};

use serde::{Deserialize, Serialize};
use serde_with::serde_as;

use super::{StartCondition, Tables};
use crate::error::TableError;

// -------------------- JSON (de)serialization --------------------

#[derive(Serialize, Deserialize)]
struct ConditionDisk {
    name: String,
    state: u16,
}

#[serde_as]
#[derive(Serialize, Deserialize)]
struct TablesDisk {
    n_states: u32,
    n_classes: u32,
    #[serde_as(as = "[_; 256]")]
    class_offset: [u32; 256],
    transitions: Vec<u32>,
    eof: Vec<u32>,
    token_names: Vec<String>,
    conditions: Vec<ConditionDisk>,
}

impl From<&Tables> for TablesDisk {
    fn from(t: &Tables) -> Self {
        Self {
            n_states: t.n_states,
            n_classes: t.n_classes,
            class_offset: t.class_offset,
            transitions: t.transitions.clone(),
            eof: t.eof.clone(),
            token_names: t.token_names.clone(),
            conditions: t
                .conditions
                .iter()
                .map(|c| ConditionDisk {
                    name: c.name.clone(),
                    state: c.state,
                })
                .collect(),
        }
    }
}

impl TablesDisk {
    fn into_tables(self) -> Tables {
        Tables {
            class_offset: self.class_offset,
            transitions: self.transitions,
            eof: self.eof,
            token_names: self.token_names,
            conditions: self
                .conditions
                .into_iter()
                .map(|c| StartCondition {
                    name: c.name,
                    state: c.state,
                })
                .collect(),
            n_states: self.n_states,
            n_classes: self.n_classes,
        }
    }
}

pub fn save_tables_json(path: &Path, t: &Tables) -> Result<(), TableError> {
    let f = std::fs::File::create(path)?;
    let mut w = BufWriter::new(f);
    serde_json::to_writer(&mut w, &TablesDisk::from(t))?;
    w.flush()?;
    Ok(())
}

pub fn load_tables_json_bytes(data: &[u8]) -> Result<Tables, TableError> {
    let t = serde_json::from_slice::<TablesDisk>(data)?.into_tables();
    t.validate()?;
    Ok(t)
}

// -------------------- Compact binary --------------------

const BIN_MAGIC: &[u8; 8] = b"BLXTBL01";

pub fn write_tables_bin<W: Write>(w: &mut W, t: &Tables) -> Result<(), TableError> {
    w.write_all(BIN_MAGIC)?;
    for v in [
        t.n_states,
        t.n_classes,
        t.token_names.len() as u32,
        t.conditions.len() as u32,
    ] {
        w.write_all(&v.to_le_bytes())?;
    }

    // Words go out in big chunks to keep syscalls down.
    const CHUNK: usize = 1 << 16;
    let mut bytes = Vec::with_capacity(CHUNK * 4);
    for chunk in t
        .class_offset
        .chunks(CHUNK)
        .chain(t.transitions.chunks(CHUNK))
        .chain(t.eof.chunks(CHUNK))
    {
        bytes.clear();
        for &v in chunk {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        w.write_all(&bytes)?;
    }

    for name in &t.token_names {
        w.write_all(&(name.len() as u32).to_le_bytes())?;
        w.write_all(name.as_bytes())?;
    }
    for c in &t.conditions {
        w.write_all(&(c.state as u32).to_le_bytes())?;
        w.write_all(&(c.name.len() as u32).to_le_bytes())?;
        w.write_all(c.name.as_bytes())?;
    }
    Ok(())
}

pub fn save_tables_bin(path: &Path, t: &Tables) -> Result<(), TableError> {
    let instant = Instant::now();
    let f = std::fs::File::create(path)?;
    let mut w = BufWriter::new(f);
    write_tables_bin(&mut w, t)?;
    w.flush()?;
    log::info!(
        "[tables] saved {} in {} ms",
        path.display(),
        instant.elapsed().as_millis()
    );
    Ok(())
}

pub fn load_tables_bin_bytes(mut data: &[u8]) -> Result<Tables, TableError> {
    if data.len() < BIN_MAGIC.len() {
        return Err(TableError::Truncated("header"));
    }
    if &data[..BIN_MAGIC.len()] != BIN_MAGIC {
        return Err(TableError::BadMagic);
    }
    data = &data[BIN_MAGIC.len()..];

    let read_u32 = |buf: &mut &[u8], what: &'static str| -> Result<u32, TableError> {
        if buf.len() < 4 {
            return Err(TableError::Truncated(what));
        }
        let mut le = [0u8; 4];
        le.copy_from_slice(&buf[..4]);
        *buf = &buf[4..];
        Ok(u32::from_le_bytes(le))
    };
    let read_str = |buf: &mut &[u8], what: &'static str| -> Result<String, TableError> {
        let len = read_u32(buf, what)? as usize;
        if buf.len() < len {
            return Err(TableError::Truncated(what));
        }
        let s = std::str::from_utf8(&buf[..len])
            .map_err(|e| TableError::Invalid(format!("{what}: {e}")))?
            .to_string();
        *buf = &buf[len..];
        Ok(s)
    };
    let read_words = |buf: &mut &[u8],
                      count: usize,
                      what: &'static str|
     -> Result<Vec<u32>, TableError> {
        let bytes = count.checked_mul(4).ok_or(TableError::Truncated(what))?;
        if buf.len() < bytes {
            return Err(TableError::Truncated(what));
        }
        let words = buf[..bytes]
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect::<Vec<u32>>();
        *buf = &buf[bytes..];
        Ok(words)
    };

    let n_states = read_u32(&mut data, "state count")?;
    let n_classes = read_u32(&mut data, "class count")?;
    let n_kinds = read_u32(&mut data, "token count")? as usize;
    let n_conditions = read_u32(&mut data, "condition count")? as usize;

    let mut class_offset = [0u32; 256];
    class_offset.copy_from_slice(&read_words(&mut data, 256, "class offsets")?);
    let cells = (n_states as usize)
        .checked_mul(n_classes as usize)
        .ok_or_else(|| TableError::Invalid("transition matrix size overflows".into()))?;
    let transitions = read_words(&mut data, cells, "transitions")?;
    let eof = read_words(&mut data, n_states as usize, "eof words")?;

    // Counts come from the file; don't trust them for preallocation.
    let mut token_names = Vec::new();
    for _ in 0..n_kinds {
        token_names.push(read_str(&mut data, "token names")?);
    }
    let mut conditions = Vec::new();
    for _ in 0..n_conditions {
        let state = read_u32(&mut data, "conditions")?;
        let state = u16::try_from(state)
            .map_err(|_| TableError::Invalid(format!("condition state {state} exceeds u16")))?;
        let name = read_str(&mut data, "conditions")?;
        conditions.push(StartCondition { name, state });
    }
    if !data.is_empty() {
        return Err(TableError::Invalid(format!(
            "{} trailing bytes after tables",
            data.len()
        )));
    }

    let t = Tables {
        class_offset,
        transitions,
        eof,
        token_names,
        conditions,
        n_states,
        n_classes,
    };
    t.validate()?;
    Ok(t)
}

/// Load `.json` files as JSON and anything else as the binary format.
pub fn load_tables_path(path: &Path) -> Result<Tables, TableError> {
    let data = std::fs::read(path)?;
    if path.extension().is_some_and(|e| e == "json") {
        load_tables_json_bytes(&data)
    } else {
        load_tables_bin_bytes(&data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::Grammar;
    use crate::lexer::tables::build_grammar;

    fn tables() -> Tables {
        let mut g = Grammar::new();
        g.condition("str")
            .pattern("word", "[a-z]+")
            .literal("quote", "\"");
        g.rule(crate::grammar::RuleSpec::pattern("body", "[^\"]+").within(["str"]));
        build_grammar(&g).unwrap().tables
    }

    #[test]
    fn binary_round_trip_is_exact() {
        let t = tables();
        let mut buf = Vec::new();
        write_tables_bin(&mut buf, &t).unwrap();
        assert_eq!(load_tables_bin_bytes(&buf).unwrap(), t);
    }

    #[test]
    fn json_round_trip_is_exact() {
        let t = tables();
        let json = serde_json::to_vec(&TablesDisk::from(&t)).unwrap();
        assert_eq!(load_tables_json_bytes(&json).unwrap(), t);
    }

    #[test]
    fn corrupted_binaries_are_rejected() {
        let t = tables();
        let mut buf = Vec::new();
        write_tables_bin(&mut buf, &t).unwrap();

        let mut magic = buf.clone();
        magic[0] = b'X';
        assert!(matches!(load_tables_bin_bytes(&magic), Err(TableError::BadMagic)));

        let short = &buf[..buf.len() - 3];
        assert!(matches!(
            load_tables_bin_bytes(short),
            Err(TableError::Truncated(_))
        ));

        // First transition word: point it past the last state.
        let first_word = 8 + 16 + 256 * 4;
        let mut bad_next = buf.clone();
        bad_next[first_word..first_word + 4].copy_from_slice(&0xFFFFu32.to_le_bytes());
        assert!(matches!(
            load_tables_bin_bytes(&bad_next),
            Err(TableError::Invalid(_))
        ));

        let mut reserved = buf.clone();
        reserved[first_word + 3] |= 0x10;
        assert!(matches!(
            load_tables_bin_bytes(&reserved),
            Err(TableError::Invalid(_))
        ));
    }
}

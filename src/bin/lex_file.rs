// src/bin/lex_file.rs
// Stream a file through saved scanner tables.
//
//   lex_file <tables.bin|tables.json> <input>
//
// Env:
//   LEX_CHUNK=<bytes>   read buffer size (default 65536)
//   LEX_START=<name>    start condition (default: first declared)
//   LEX_PRINT=1         print every token instead of per-kind counts

use std::{fs::File, io::Read, path::PathBuf, time::Instant};

use anyhow::{Context, Result, anyhow, bail};
use bytelex::{
    Scanner, TokenKind,
    lexer::{collect::tokens_from_sinks, tables::load_tables_path},
};

fn env_usize(name: &str, default: usize) -> usize {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn main() -> Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let (Some(tables_path), Some(input_path)) = (args.next(), args.next()) else {
        bail!("usage: lex_file <tables.bin|tables.json> <input>");
    };
    let (tables_path, input_path) = (PathBuf::from(tables_path), PathBuf::from(input_path));

    let tables = load_tables_path(&tables_path)
        .with_context(|| format!("loading {}", tables_path.display()))?;
    let chunk = env_usize("LEX_CHUNK", 1 << 16).max(1);
    let print = std::env::var("LEX_PRINT").ok().as_deref() == Some("1");
    let start = match std::env::var("LEX_START") {
        Ok(name) => Some(
            tables
                .condition_id(&name)
                .ok_or_else(|| anyhow!("no start condition named '{name}'"))?,
        ),
        Err(_) => None,
    };

    let mut file =
        File::open(&input_path).with_context(|| format!("opening {}", input_path.display()))?;
    let len = file.metadata()?.len() as usize;

    // One slot per byte covers every token, including the last.
    let mut kinds = vec![TokenKind(0); len];
    let mut ends = vec![0usize; len];
    let mut buf = vec![0u8; chunk];

    let t0 = Instant::now();
    let mut offset = 0usize;
    let (count, scanned) = {
        let mut sc = Scanner::new(&tables);
        sc.set_buffers(&mut kinds, &mut ends);
        if let Some(cond) = start {
            sc.set_state(cond);
        }
        loop {
            let n = file.read(&mut buf)?;
            if n == 0 {
                break;
            }
            if offset + n > len {
                bail!("{} grew while being read", input_path.display());
            }
            sc.scan(&buf[..n], offset);
            offset += n;
        }
        sc.finalize();
        (sc.token_count(), sc.stream_end())
    };
    let elapsed = t0.elapsed();

    let tokens = tokens_from_sinks(&kinds[..count], &ends[..count], 0);
    if print {
        let mut input = Vec::with_capacity(len);
        File::open(&input_path)?.read_to_end(&mut input)?;
        for t in &tokens {
            println!(
                "{:>8} {:>6} {:<16} {:?}",
                t.start,
                t.len,
                tables.token_name(t.kind).unwrap_or("?"),
                String::from_utf8_lossy(t.lexeme(&input))
            );
        }
    } else {
        let mut per_kind = vec![0usize; tables.token_names.len()];
        for t in &tokens {
            per_kind[t.kind.id() as usize] += 1;
        }
        for (name, n) in tables.token_names.iter().zip(&per_kind) {
            if *n > 0 {
                println!("{name:<16} {n}");
            }
        }
    }

    let unmatched = tokens.iter().filter(|t| t.is_no_match()).count();
    let mb = scanned as f64 / (1024.0 * 1024.0);
    eprintln!(
        "[lex_file] {} bytes -> {} tokens ({} unmatched) in {:.3} ms ({:.1} MiB/s, chunk {})",
        scanned,
        tokens.len(),
        unmatched,
        elapsed.as_secs_f64() * 1e3,
        mb / elapsed.as_secs_f64().max(1e-9),
        chunk
    );
    Ok(())
}

// src/bin/fuzz_lex.rs
// Random inputs through several builds of the same grammar; every variant
// and every way of splitting the stream must give the same tokens.
//
//   fuzz_lex [grammar.json]        (default: grammars/demo.json, built in)
//
// Env:
//   FUZZ_SEED=<u64>       rng seed (default 42)
//   FUZZ_ITERS=<n>        iterations (default 200)
//   FUZZ_MAX_LEN=<bytes>  max input length (default 4096)
//   FUZZ_SAVE=1           save failing inputs under FUZZ_DIR (default fuzz-cases)
//   FUZZ_INPUT=<path>     replay one saved input

use std::{
    fs,
    path::{Path, PathBuf},
    time::Instant,
};

use anyhow::{Context, Result, bail};
use bytelex::{
    BuildOptions, Grammar, GrammarFile, Scanner, Tables, TokenKind, build_grammar,
    lexer::{Token, collect::tokens_from_sinks, lex},
};
use rand::{Rng, SeedableRng, rngs::StdRng};

const DEMO_GRAMMAR: &[u8] = include_bytes!("../../grammars/demo.json");

fn env_u64(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

struct Variants {
    reference: Tables,
    others: Vec<(&'static str, Tables)>,
}

fn build_variants(grammar: &Grammar) -> Result<Variants> {
    let with = |compress_alphabet, minimize| -> Result<Tables> {
        let mut g = grammar.clone();
        g.options(BuildOptions {
            compress_alphabet,
            minimize,
        });
        Ok(build_grammar(&g)?.tables)
    };
    Ok(Variants {
        reference: with(true, true)?,
        others: vec![
            ("uncompressed", with(false, true)?),
            ("unminimized", with(true, false)?),
            ("raw", with(false, false)?),
        ],
    })
}

/// Bytes the grammar cares about, so random input actually forms tokens.
fn byte_pool(grammar: &Grammar) -> Vec<u8> {
    let mut pool: Vec<u8> = b"azAZ_09 \t\n\"\\".to_vec();
    for r in grammar.rules() {
        if let Some(lit) = &r.literal {
            pool.extend_from_slice(lit.as_bytes());
        }
    }
    pool.sort_unstable();
    pool.dedup();
    pool
}

fn gen_input<R: Rng>(rng: &mut R, pool: &[u8], max_len: usize) -> Vec<u8> {
    let len = rng.random_range(0..=max_len);
    (0..len)
        .map(|_| {
            if rng.random_range(0u32..100) < 3 {
                rng.random::<u8>()
            } else {
                pool[rng.random_range(0..pool.len())]
            }
        })
        .collect()
}

/// Feed at random split points, mixing `feed`+`run` with `scan`.
fn lex_split<R: Rng>(rng: &mut R, t: &Tables, input: &[u8]) -> Vec<Token> {
    let mut kinds = vec![TokenKind(0); input.len()];
    let mut ends = vec![0usize; input.len()];
    let count = {
        let mut sc = Scanner::new(t);
        sc.set_buffers(&mut kinds, &mut ends);
        let mut off = 0;
        while off < input.len() {
            let take = rng.random_range(0..=(input.len() - off).min(64));
            let piece = &input[off..off + take];
            if rng.random::<bool>() {
                sc.feed(piece, off);
                sc.run();
            } else {
                sc.scan(piece, off);
            }
            off += take;
        }
        sc.finalize();
        sc.token_count()
    };
    tokens_from_sinks(&kinds[..count], &ends[..count], 0)
}

fn check_tiling(tokens: &[Token], len: usize) -> Result<()> {
    let mut at = 0;
    for (i, t) in tokens.iter().enumerate() {
        if t.start != at || t.len == 0 {
            bail!("token {i} {:?} does not continue at offset {at}", t);
        }
        at = t.end();
    }
    if at != len {
        bail!("tokens cover {at} of {len} bytes");
    }
    Ok(())
}

fn run_once<R: Rng>(rng: &mut R, v: &Variants, input: &[u8]) -> Result<usize> {
    let want = lex(&v.reference, input);
    check_tiling(&want, input.len())?;
    for (label, t) in &v.others {
        let got = lex(t, input);
        if got != want {
            dump_diff(&v.reference, &want, &got);
            bail!("{label} tables disagree with the reference");
        }
    }
    let split = lex_split(rng, &v.reference, input);
    if split != want {
        dump_diff(&v.reference, &want, &split);
        bail!("split feeding disagrees with one-shot scanning");
    }
    Ok(want.len())
}

fn dump_diff(t: &Tables, want: &[Token], got: &[Token]) {
    let first = want
        .iter()
        .zip(got)
        .position(|(a, b)| a != b)
        .unwrap_or(want.len().min(got.len()));
    let lo = first.saturating_sub(2);
    eprintln!("--- first difference at token #{first} ---");
    for i in lo..(first + 4).max(lo) {
        let show = |tok: Option<&Token>| {
            tok.map(|x| {
                format!(
                    "{}@{}+{}",
                    t.token_name(x.kind).unwrap_or("?"),
                    x.start,
                    x.len
                )
            })
            .unwrap_or_else(|| "-".into())
        };
        eprintln!(
            "#{i:06} want={:<24} got={}",
            show(want.get(i)),
            show(got.get(i))
        );
    }
}

fn save_case(dir: &str, seed: u64, iter: u64, input: &[u8]) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("creating {dir}"))?;
    let path = Path::new(dir).join(format!("case_s{seed}_i{iter}_n{}.bin", input.len()));
    fs::write(&path, input).with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}

fn main() -> Result<()> {
    env_logger::init();

    let grammar = match std::env::args().nth(1) {
        Some(p) => GrammarFile::load(Path::new(&p))?.into_grammar(),
        None => GrammarFile::from_json(DEMO_GRAMMAR)?.into_grammar(),
    };
    let t0 = Instant::now();
    let variants = build_variants(&grammar)?;
    eprintln!(
        "[fuzz] built 4 table variants in {} ms ({} states, {} classes)",
        t0.elapsed().as_millis(),
        variants.reference.n_states,
        variants.reference.n_classes
    );

    let seed = env_u64("FUZZ_SEED", 42);
    let mut rng = StdRng::seed_from_u64(seed);

    // --- REPLAY A SINGLE CASE ---
    if let Ok(path) = std::env::var("FUZZ_INPUT") {
        let input = fs::read(&path).with_context(|| format!("reading {path}"))?;
        let n = run_once(&mut rng, &variants, &input)?;
        eprintln!("[replay] {} bytes -> {n} tokens OK", input.len());
        return Ok(());
    }

    let iters = env_u64("FUZZ_ITERS", 200);
    let max_len = env_u64("FUZZ_MAX_LEN", 4096) as usize;
    let save = std::env::var("FUZZ_SAVE").ok().as_deref() == Some("1");
    let dir = std::env::var("FUZZ_DIR").unwrap_or_else(|_| "fuzz-cases".to_string());
    let pool = byte_pool(&grammar);
    eprintln!("[fuzz] iters={iters} max_len={max_len} seed={seed}");

    let mut tokens = 0usize;
    let mut bytes = 0usize;
    for i in 0..iters {
        let input = gen_input(&mut rng, &pool, max_len);
        match run_once(&mut rng, &variants, &input) {
            Ok(n) => {
                tokens += n;
                bytes += input.len();
            }
            Err(e) => {
                eprintln!("[fuzz] iter {i} (seed {seed}): {e}");
                if save {
                    let p = save_case(&dir, seed, i, &input)?;
                    eprintln!("[save] wrote {}", p.display());
                }
                std::process::exit(1);
            }
        }
    }
    eprintln!(
        "[fuzz] {iters} iterations, {bytes} bytes, {tokens} tokens: all variants matched in {} ms",
        t0.elapsed().as_millis()
    );
    Ok(())
}

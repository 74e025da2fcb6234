use std::env;
use std::process;

use anyhow::{bail, Context, Result};
use re_static::{analyze, Flags};

const USAGE: &str = "usage: re-static [-f FLAGS] PATTERN";

// Flags are either inline-flag letters (`ix`) or the host's integer value.
fn parse_flags(text: &str) -> Result<Flags> {
    if let Ok(bits) = text.parse::<u32>() {
        return Ok(Flags::from_bits_truncate(bits));
    }
    text.chars().try_fold(Flags::empty(), |flags, c| match Flags::from_letter(c) {
        Some(flag) => Ok(flags | flag),
        None => bail!("unknown flag '{c}'"),
    })
}

fn run() -> Result<()> {
    let mut args = env::args().skip(1);
    let mut flags = Flags::empty();
    let mut pattern = None;
    while let Some(arg) = args.next() {
        if arg == "-f" {
            let text = args.next().context("expected flags after '-f'")?;
            flags |= parse_flags(&text)?;
        } else if pattern.is_none() {
            pattern = Some(arg);
        } else {
            bail!("unexpected argument '{arg}'\n{USAGE}");
        }
    }
    let pattern = pattern.context(USAGE)?;

    let groups = analyze(&pattern, flags).with_context(|| format!("invalid pattern {pattern:?}"))?;
    for group in groups {
        let presence = if group.always_present { "always" } else { "optional" };
        println!("{}\t{}\t{}", group.index, group.name.as_deref().unwrap_or("-"), presence);
    }
    Ok(())
}

// Usage: re-static [-f FLAGS] PATTERN
fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        process::exit(1);
    }
}

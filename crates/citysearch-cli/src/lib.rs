//! citysearch-cli
//! ==============
//!
//! Command-line interface for the `citysearch-core` location lookup service.
//!
//! This crate primarily provides a binary (`citysearch`). The library target
//! only carries this overview.
//!
//! Basic usage:
//!
//! ```text
//! citysearch --help
//! citysearch search phoenix
//! citysearch search spring --state Illinois --limit 3
//! citysearch --dataset https://example.com/us_cities.csv.gz stats
//! citysearch lookup "Phoenix, AZ" --json
//! printf 'b\nbo\nbos\n' | citysearch interactive
//! ```
//!
//! Configuration is layered: CLI flags over `CITYSEARCH_*` environment
//! variables over the `--config` TOML file over built-in defaults. Run
//! `citysearch config` for a commented example. Log verbosity follows
//! `RUST_LOG` (default `warn`).
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod bidix;
pub mod clean;
pub mod cli;
pub mod config;
pub mod filter;
pub mod lang;
pub mod merge;
pub mod models;
pub mod morph;
pub mod path;
pub mod pipeline;
pub mod reader;
pub mod report;
pub mod utils;
pub mod wikt;

use anyhow::Result;
use fxhash::FxBuildHasher;
use indexmap::{IndexMap, IndexSet};

use std::io::Write;

use crate::bidix::{build_bidix, build_monodix};
use crate::clean::{clean_term, is_valid_lemma_exempt};
use crate::config::Source;
use crate::filter::{FilterStats, filter_entries};
use crate::lang::{DumpLang, Lang, Pos};
use crate::merge::{ConflictLog, align_entries, merge_entries};
use crate::models::entry::{Entry, Sense, Translation};
use crate::morph::{infer_paradigm, infer_pos};
use crate::path::PathManager;
use crate::pipeline::{Stage, StageCtx};
use crate::reader::dump::{DumpReader, is_article_title};
use crate::reader::langlinks::LanglinkReader;
use crate::utils::{
    pretty_println_at_path, read_json, read_jsonl, write_atomic, write_json, write_jsonl,
};
use crate::wikt::wikipedia::{
    TitleRecord, accumulate_frequency, classify, top_n_set, vocab_entry,
};
use crate::wikt::{ParseStats, SourceParser, parse_inline_page, parse_pivot_page, via};

pub type Map<K, V> = IndexMap<K, V, FxBuildHasher>; // Preserve insertion order
pub type Set<K> = IndexSet<K, FxBuildHasher>;

fn progress(quiet: bool, every: u64, pages: u64) {
    if !quiet && every > 0 && pages > 0 && pages % every == 0 {
        print!("Processed {pages} pages...\r");
        let _ = std::io::stdout().flush();
    }
}

fn finish_progress(quiet: bool, every: u64, pages: u64) {
    if !quiet && every > 0 && pages >= every {
        println!();
    }
}

/// Shared tail of every extraction stage: entries artifact + stats artifact.
fn write_extraction(
    ctx: &StageCtx,
    stage: &'static str,
    artifact: &std::path::Path,
    entries: &[Entry],
    stats: &ParseStats,
) -> Result<()> {
    write_jsonl(artifact, entries)?;
    write_json(&ctx.pm.path_stats(stage), stats, ctx.opts.pretty)?;
    if !ctx.opts.quiet {
        pretty_println_at_path(&format!("Wrote {} entries", entries.len()), artifact);
    }
    Ok(())
}

fn extract_inline(ctx: &StageCtx, dump: DumpLang, stage: &'static str) -> Result<()> {
    let mut reader = DumpReader::open(&ctx.pm.path_wiktionary_dump(dump))?;
    let mut stats = ParseStats::default();
    let mut entries = Vec::new();

    while let Some(page) = reader.next_page()? {
        entries.extend(parse_inline_page(dump, &page, ctx.cfg, &mut stats));
        progress(ctx.opts.quiet, ctx.cfg.progress_every, reader.pages_read);
    }
    finish_progress(ctx.opts.quiet, ctx.cfg.progress_every, reader.pages_read);
    stats.parse_errors = reader.pages_faulty;

    write_extraction(ctx, stage, &ctx.pm.path_extracted(dump), &entries, &stats)
}

fn extract_pivot(ctx: &StageCtx, dump: DumpLang, stage: &'static str) -> Result<()> {
    let mut reader = DumpReader::open(&ctx.pm.path_wiktionary_dump(dump))?;
    let mut stats = ParseStats::default();
    let mut entries = Vec::new();

    while let Some(page) = reader.next_page()? {
        if let Some(pivot) = parse_pivot_page(dump, &page, &mut stats) {
            match dump {
                // block-labelled meanings: pair only inside one block
                DumpLang::Fr => entries.extend(via::via_meaning(&pivot, ctx.cfg)),
                _ => entries.extend(via::via_cooccurrence(dump, &pivot, ctx.cfg)),
            }
        }
        progress(ctx.opts.quiet, ctx.cfg.progress_every, reader.pages_read);
    }
    finish_progress(ctx.opts.quiet, ctx.cfg.progress_every, reader.pages_read);
    stats.parse_errors = reader.pages_faulty;
    stats.entries_emitted = entries.len() as u64;

    write_extraction(ctx, stage, &ctx.pm.path_extracted(dump), &entries, &stats)
}

/// The one dispatch site over the closed parser sum type. A new source is a
/// new variant plus an arm here.
fn run_parser(ctx: &StageCtx, parser: SourceParser) -> Result<()> {
    match parser {
        SourceParser::WiktionaryInline { dump } => extract_inline(ctx, dump, parser.stage_name()),
        SourceParser::WiktionaryTemplate { dump } => extract_pivot(ctx, dump, parser.stage_name()),
        SourceParser::WikipediaCategory => extract_wikipedia(ctx),
        SourceParser::LanglinkPivot => extract_langlinks(ctx),
    }
}

fn stage_io_wiktionary(ctx: &StageCtx) -> Result<()> {
    run_parser(ctx, SourceParser::WiktionaryInline { dump: DumpLang::Io })
}

fn stage_eo_wiktionary(ctx: &StageCtx) -> Result<()> {
    run_parser(ctx, SourceParser::WiktionaryInline { dump: DumpLang::Eo })
}

fn stage_en_wiktionary(ctx: &StageCtx) -> Result<()> {
    run_parser(ctx, SourceParser::WiktionaryTemplate { dump: DumpLang::En })
}

fn stage_fr_wiktionary(ctx: &StageCtx) -> Result<()> {
    run_parser(ctx, SourceParser::WiktionaryTemplate { dump: DumpLang::Fr })
}

fn stage_wikipedia(ctx: &StageCtx) -> Result<()> {
    run_parser(ctx, SourceParser::WikipediaCategory)
}

fn stage_langlinks(ctx: &StageCtx) -> Result<()> {
    run_parser(ctx, SourceParser::LanglinkPivot)
}

fn extract_wikipedia(ctx: &StageCtx) -> Result<()> {
    let mut reader = DumpReader::open(&ctx.pm.path_wikipedia_dump())?;
    let mut stats = ParseStats::default();
    let mut entries = Vec::new();
    let mut titles: Map<String, TitleRecord> = Map::default();
    let mut freq: Map<String, u64> = Map::default();

    while let Some(page) = reader.next_page()? {
        stats.pages_seen += 1;
        let class = classify(&page.text);
        titles.insert(
            page.id.to_string(),
            TitleRecord {
                title: page.title.clone(),
                class,
            },
        );
        if let Some(entry) = vocab_entry(&page.title, class, &mut stats) {
            entries.push(entry);
        }
        accumulate_frequency(&page.text, &mut freq);
        progress(ctx.opts.quiet, ctx.cfg.progress_every, reader.pages_read);
    }
    finish_progress(ctx.opts.quiet, ctx.cfg.progress_every, reader.pages_read);
    stats.pages_matched = stats.pages_seen;
    stats.parse_errors = reader.pages_faulty;

    write_json(&ctx.pm.path_wikipedia_titles(), &titles, ctx.opts.pretty)?;
    write_json(&ctx.pm.path_wikipedia_frequency(), &freq, ctx.opts.pretty)?;
    write_extraction(
        ctx,
        "wikipedia",
        &ctx.pm.path_wikipedia_vocab(),
        &entries,
        &stats,
    )
}

fn extract_langlinks(ctx: &StageCtx) -> Result<()> {
    let titles_path = ctx.pm.path_wikipedia_titles();
    let titles: Map<String, TitleRecord> = if titles_path.exists() {
        read_json(&titles_path)?
    } else {
        Map::default()
    };

    let mut reader = LanglinkReader::open(&ctx.pm.path_langlinks_dump())?;
    let mut stats = ParseStats::default();
    let mut entries = Vec::new();
    let mut seen_io: Set<String> = Set::default();
    let confidence = ctx.cfg.confidence(Source::IoWikipedia);

    while let Some(row) = reader.next_row()? {
        stats.pages_seen += 1;
        if row.lang != "eo" {
            continue;
        }
        let Some(record) = titles.get(&row.from_id.to_string()) else {
            continue;
        };
        if !is_article_title(&record.title) {
            continue;
        }
        stats.pages_matched += 1;

        let allow_acronym = record.class.is_proper();
        let io_lemma = clean_term(&record.title);
        if io_lemma.is_empty() || !is_valid_lemma_exempt(&io_lemma, allow_acronym) {
            stats.clean.rejected_lemmas += 1;
            continue;
        }
        let eo_term = clean_term(&row.title);
        if eo_term.is_empty() || !is_valid_lemma_exempt(&eo_term, allow_acronym) {
            stats.clean.dropped_terms += 1;
            continue;
        }

        let (lemma, pos) = if record.class.is_proper() {
            (io_lemma, Pos::ProperNoun)
        } else {
            let folded = io_lemma.to_lowercase();
            let pos = infer_pos(&folded);
            (folded, pos)
        };
        // first observation per Ido title wins, deterministic by input order
        if !seen_io.insert(lemma.clone()) {
            continue;
        }

        let mut entry = Entry::new(lemma.clone(), Lang::Io, pos, Source::IoWikipedia);
        entry.original_lemma = (entry.lemma != record.title).then(|| record.title.clone());
        if pos == Pos::ProperNoun {
            entry.morphology = Some(infer_paradigm(&lemma, pos));
        }
        entry.senses.push(Sense {
            sense_id: Some("langlink".to_string()),
            gloss: None,
            translations: vec![Translation::attested(
                eo_term,
                Lang::Eo,
                Source::IoWikipedia,
                confidence,
            )],
        });
        stats.entries_emitted += 1;
        entries.push(entry);

        progress(ctx.opts.quiet, ctx.cfg.progress_every, stats.pages_seen);
    }
    finish_progress(ctx.opts.quiet, ctx.cfg.progress_every, stats.pages_seen);
    stats.parse_errors = reader.rows_faulty;

    write_extraction(ctx, "langlinks", &ctx.pm.path_langlinks(), &entries, &stats)
}

/// Every extraction artifact that may feed the aligner. Absent artifacts
/// (their dump was never provided) are fine; the aligner reads what exists.
fn evidence_artifacts(pm: &PathManager) -> Vec<std::path::PathBuf> {
    vec![
        pm.path_extracted(DumpLang::Io),
        pm.path_extracted(DumpLang::Eo),
        pm.path_extracted(DumpLang::En),
        pm.path_extracted(DumpLang::Fr),
        pm.path_wikipedia_vocab(),
        pm.path_langlinks(),
    ]
}

fn stage_align(ctx: &StageCtx) -> Result<()> {
    let mut entries: Vec<Entry> = Vec::new();
    for artifact in evidence_artifacts(ctx.pm) {
        if !artifact.exists() {
            tracing::debug!("align: no artifact at {}", artifact.display());
            continue;
        }
        entries.extend(read_jsonl::<Entry>(&artifact)?);
    }

    // an entry survives if any of its sources is still enabled
    entries.retain(|e| e.provenance.iter().any(|&s| ctx.cfg.is_enabled(s)));

    let mut aligned = align_entries(entries);

    // pivot-derived entries arrive without a POS header; settle them by
    // morphotactics now so they land in the same merge bucket as their
    // header-attested counterparts
    for entry in &mut aligned {
        if entry.pos == Pos::Unknown {
            entry.pos = infer_pos(&entry.lemma);
        }
    }
    write_jsonl(&ctx.pm.path_aligned(), &aligned)?;
    if !ctx.opts.quiet {
        pretty_println_at_path(
            &format!("Aligned {} entries", aligned.len()),
            &ctx.pm.path_aligned(),
        );
    }
    Ok(())
}

fn stage_merge(ctx: &StageCtx) -> Result<()> {
    let entries: Vec<Entry> = read_jsonl(&ctx.pm.path_aligned())?;
    let before = entries.len();
    let (merged, conflicts) = merge_entries(entries, ctx.cfg);
    write_jsonl(&ctx.pm.path_merged(), &merged)?;
    write_json(&ctx.pm.path_conflicts(), &conflicts, ctx.opts.pretty)?;
    if !ctx.opts.quiet {
        pretty_println_at_path(
            &format!("Merged {before} entries down to {}", merged.len()),
            &ctx.pm.path_merged(),
        );
    }
    Ok(())
}

fn stage_morphology(ctx: &StageCtx) -> Result<()> {
    let mut entries: Vec<Entry> = read_jsonl(&ctx.pm.path_merged())?;
    for entry in &mut entries {
        if entry.pos == Pos::Unknown {
            entry.pos = infer_pos(&entry.lemma);
        }
        if entry.morphology.is_none() {
            entry.morphology = Some(infer_paradigm(&entry.lemma, entry.pos));
        }
    }
    write_jsonl(&ctx.pm.path_morphology(), &entries)?;
    Ok(())
}

fn stage_filter(ctx: &StageCtx) -> Result<()> {
    let entries: Vec<Entry> = read_jsonl(&ctx.pm.path_morphology())?;

    let freq_path = ctx.pm.path_wikipedia_frequency();
    let freq: Map<String, u64> = if freq_path.exists() {
        read_json(&freq_path)?
    } else {
        Map::default()
    };
    let top_words = top_n_set(&freq, ctx.cfg.wiki_top_n);

    let mut stats = FilterStats::default();
    let kept = filter_entries(entries, &top_words, &mut stats);
    write_jsonl(&ctx.pm.path_filtered(), &kept)?;
    write_json(&ctx.pm.path_stats("filter"), &stats, ctx.opts.pretty)?;
    if !ctx.opts.quiet {
        pretty_println_at_path(
            &format!("Kept {} entries", kept.len()),
            &ctx.pm.path_filtered(),
        );
    }
    Ok(())
}

fn stage_bidix(ctx: &StageCtx) -> Result<()> {
    let entries: Vec<Entry> = read_jsonl(&ctx.pm.path_filtered())?;
    let bidix = build_bidix(&entries);
    let monodix = build_monodix(&entries);
    write_jsonl(&ctx.pm.path_bidix(), &bidix)?;
    write_jsonl(&ctx.pm.path_monodix(), &monodix)?;
    if !ctx.opts.quiet {
        pretty_println_at_path(
            &format!("Wrote {} bidix entries", bidix.len()),
            &ctx.pm.path_bidix(),
        );
        pretty_println_at_path(
            &format!("Wrote {} monodix entries", monodix.len()),
            &ctx.pm.path_monodix(),
        );
    }
    Ok(())
}

const EXTRACTION_STAGES: &[&str] = &[
    "io-wiktionary",
    "eo-wiktionary",
    "en-wiktionary",
    "fr-wiktionary",
    "wikipedia",
    "langlinks",
];

fn stage_report(ctx: &StageCtx) -> Result<()> {
    let entries: Vec<Entry> = read_jsonl(&ctx.pm.path_filtered())?;

    let conflicts_path = ctx.pm.path_conflicts();
    let conflicts: ConflictLog = if conflicts_path.exists() {
        read_json(&conflicts_path)?
    } else {
        ConflictLog::default()
    };

    let mut parse_stats = Vec::new();
    for stage in EXTRACTION_STAGES {
        let path = ctx.pm.path_stats(stage);
        if path.exists() {
            parse_stats.push((stage.to_string(), read_json::<ParseStats>(&path)?));
        }
    }

    let filter_path = ctx.pm.path_stats("filter");
    let filter_stats: FilterStats = if filter_path.exists() {
        read_json(&filter_path)?
    } else {
        FilterStats::default()
    };

    let freq_path = ctx.pm.path_wikipedia_frequency();
    let freq: Map<String, u64> = if freq_path.exists() {
        read_json(&freq_path)?
    } else {
        Map::default()
    };
    let top_words = top_n_set(&freq, ctx.cfg.wiki_top_n);

    write_atomic(
        &ctx.pm.path_report_statistics(),
        report::statistics_report(&entries, &parse_stats, &filter_stats).as_bytes(),
    )?;
    write_atomic(
        &ctx.pm.path_report_coverage(),
        report::coverage_report(&entries, &top_words).as_bytes(),
    )?;
    write_atomic(
        &ctx.pm.path_report_conflicts(),
        report::conflicts_report(&conflicts).as_bytes(),
    )?;
    if !ctx.opts.quiet {
        pretty_println_at_path("Wrote reports", &ctx.pm.dir_reports());
    }
    Ok(())
}

/// The pipeline, in topological order. Fan-in happens at `align`.
pub fn build_stages(pm: &PathManager) -> Vec<Stage> {
    vec![
        Stage {
            name: "io-wiktionary",
            inputs: vec![pm.path_wiktionary_dump(DumpLang::Io)],
            outputs: vec![
                pm.path_extracted(DumpLang::Io),
                pm.path_stats("io-wiktionary"),
            ],
            run: stage_io_wiktionary,
        },
        Stage {
            name: "eo-wiktionary",
            inputs: vec![pm.path_wiktionary_dump(DumpLang::Eo)],
            outputs: vec![
                pm.path_extracted(DumpLang::Eo),
                pm.path_stats("eo-wiktionary"),
            ],
            run: stage_eo_wiktionary,
        },
        Stage {
            name: "en-wiktionary",
            inputs: vec![pm.path_wiktionary_dump(DumpLang::En)],
            outputs: vec![
                pm.path_extracted(DumpLang::En),
                pm.path_stats("en-wiktionary"),
            ],
            run: stage_en_wiktionary,
        },
        Stage {
            name: "fr-wiktionary",
            inputs: vec![pm.path_wiktionary_dump(DumpLang::Fr)],
            outputs: vec![
                pm.path_extracted(DumpLang::Fr),
                pm.path_stats("fr-wiktionary"),
            ],
            run: stage_fr_wiktionary,
        },
        Stage {
            name: "wikipedia",
            inputs: vec![pm.path_wikipedia_dump()],
            outputs: vec![
                pm.path_wikipedia_vocab(),
                pm.path_wikipedia_titles(),
                pm.path_wikipedia_frequency(),
                pm.path_stats("wikipedia"),
            ],
            run: stage_wikipedia,
        },
        Stage {
            name: "langlinks",
            inputs: vec![pm.path_langlinks_dump(), pm.path_wikipedia_titles()],
            outputs: vec![pm.path_langlinks(), pm.path_stats("langlinks")],
            run: stage_langlinks,
        },
        Stage {
            name: "align",
            inputs: evidence_artifacts(pm),
            outputs: vec![pm.path_aligned()],
            run: stage_align,
        },
        Stage {
            name: "merge",
            inputs: vec![pm.path_aligned()],
            outputs: vec![pm.path_merged(), pm.path_conflicts()],
            run: stage_merge,
        },
        Stage {
            name: "morphology",
            inputs: vec![pm.path_merged()],
            outputs: vec![pm.path_morphology()],
            run: stage_morphology,
        },
        Stage {
            name: "filter",
            inputs: vec![pm.path_morphology(), pm.path_wikipedia_frequency()],
            outputs: vec![pm.path_filtered(), pm.path_stats("filter")],
            run: stage_filter,
        },
        Stage {
            name: "bidix",
            inputs: vec![pm.path_filtered()],
            outputs: vec![pm.path_bidix(), pm.path_monodix()],
            run: stage_bidix,
        },
        Stage {
            name: "report",
            inputs: vec![pm.path_filtered(), pm.path_conflicts()],
            outputs: vec![
                pm.path_report_statistics(),
                pm.path_report_coverage(),
                pm.path_report_conflicts(),
            ],
            run: stage_report,
        },
    ]
}

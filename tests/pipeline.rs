//! End-to-end pipeline runs over synthetic dumps.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use bzip2::Compression;
use bzip2::write::BzEncoder;
use flate2::write::GzEncoder;

use ideo::build_stages;
use ideo::cli::Options;
use ideo::config::{Source, SourceConfig};
use ideo::lang::Pos;
use ideo::models::bidix::{BidixEntry, MonodixEntry};
use ideo::models::entry::Entry;
use ideo::morph::Paradigm;
use ideo::path::PathManager;
use ideo::pipeline::{PipelineState, StageCtx, StageStatus, run_pipeline};
use ideo::utils::read_jsonl;

fn write_wiki_dump(path: &Path, pages: &[(u64, &str, &str)]) {
    let mut xml = String::from("<mediawiki>\n");
    for (id, title, text) in pages {
        xml.push_str(&format!(
            "<page><title>{title}</title><ns>0</ns><id>{id}</id>\
             <revision><id>9{id}</id><text>{text}</text></revision></page>\n"
        ));
    }
    xml.push_str("</mediawiki>\n");

    let mut encoder = BzEncoder::new(File::create(path).unwrap(), Compression::default());
    encoder.write_all(xml.as_bytes()).unwrap();
    encoder.finish().unwrap();
}

fn write_langlinks_dump(path: &Path, sql: &str) {
    let mut encoder = GzEncoder::new(File::create(path).unwrap(), flate2::Compression::default());
    encoder.write_all(sql.as_bytes()).unwrap();
    encoder.finish().unwrap();
}

fn seed_dumps(pm: &PathManager) {
    use ideo::lang::DumpLang;

    write_wiki_dump(
        &pm.path_wiktionary_dump(DumpLang::Io),
        &[
            (
                1,
                "abasar",
                "== Ido ==\n=== Verbo ===\n'''1.''' madaldama; '''2.''' malaltigi\n",
            ),
            (
                2,
                "banko",
                "== Ido ==\n=== Substantivo ===\n* {{eo}}: {{t|eo|banko}}\n",
            ),
            (
                3,
                "stulo",
                "== Ido ==\n=== Substantivo ===\n* {{eo}}: {{t|eo|seĝo}}\n",
            ),
        ],
    );

    write_wiki_dump(
        &pm.path_wiktionary_dump(DumpLang::Eo),
        &[(
            1,
            "seĝo",
            "== Esperanto ==\n=== Substantivo ===\n* {{io}}: stulo\n",
        )],
    );

    write_wiki_dump(
        &pm.path_wiktionary_dump(DumpLang::En),
        &[(
            1,
            "bank",
            "==English==\n===Noun===\n====Translations====\n\
             {{trans-top|financial institution}}\n\
             * Esperanto: {{t+|eo|banko}}\n\
             * Ido: {{t|io|banko}}\n\
             {{trans-bottom}}\n",
        )],
    );

    write_wiki_dump(
        &pm.path_wiktionary_dump(DumpLang::Fr),
        &[
            (
                1,
                "chaise",
                "== {{langue|fr}} ==\n=== {{S|nom|fr}} ===\n\
                 {{trad-début|Siège avec dossier}}\n\
                 * {{T|io}} : stulo\n\
                 * {{T|eo}} : seĝo\n\
                 {{trad-fin}}\n",
            ),
            // the io and eo terms sit in different meaning blocks: no pair
            (
                2,
                "table",
                "== {{langue|fr}} ==\n=== {{S|nom|fr}} ===\n\
                 {{trad-début|Meuble}}\n\
                 * {{T|io}} : tablo\n\
                 {{trad-fin}}\n\
                 {{trad-début|Tableau}}\n\
                 * {{T|eo}} : tablo\n\
                 {{trad-fin}}\n",
            ),
        ],
    );

    write_wiki_dump(
        &pm.path_wikipedia_dump(),
        &[
            (
                10,
                "Acensilo",
                "acensilo acensilo acensilo acensilo acensilo acensilo",
            ),
            (
                11,
                "Abdulino",
                "organizuro mikra [[Kategorio:Organizuri internaciona]]",
            ),
            (12, "Stulo", "urbo mikra [[Kategorio:Urbi di Testlando]]"),
            (13, "Rarajo", "vorto rara sen frequeso"),
        ],
    );

    write_langlinks_dump(
        &pm.path_langlinks_dump(),
        "-- MySQL dump\n\
         INSERT INTO `langlinks` VALUES (11,'eo','Abdulino'),(10,'eo','Lifto'),(12,'en','Chair');\n",
    );
}

fn options_for(root: &Path) -> Options {
    Options {
        root_dir: root.to_path_buf(),
        top_n: 1,
        quiet: true,
        ..Default::default()
    }
}

fn run_once(pm: &PathManager, opts: &Options) {
    let cfg = SourceConfig::from_options(opts);
    let stages = build_stages(pm);
    let ctx = StageCtx {
        pm,
        cfg: &cfg,
        opts,
    };
    run_pipeline(&ctx, &stages, opts.force, opts.from_stage.as_deref()).unwrap();
}

fn setup(root: &Path) -> (PathManager, Options) {
    let pm = PathManager::new(root);
    pm.setup_dirs().unwrap();
    seed_dumps(&pm);
    (pm, options_for(root))
}

fn find_entry<'a>(entries: &'a [Entry], lemma: &str, pos: Pos) -> &'a Entry {
    entries
        .iter()
        .find(|e| e.lemma == lemma && e.pos == pos)
        .unwrap_or_else(|| panic!("no entry {lemma}/{pos:?}"))
}

#[test]
fn full_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let (pm, opts) = setup(dir.path());
    run_once(&pm, &opts);

    let state = PipelineState::load(&pm.path_state()).unwrap();
    for (name, stage) in &state.stages {
        assert_eq!(
            stage.status,
            StageStatus::Completed,
            "stage {name} not completed"
        );
    }

    let entries: Vec<Entry> = read_jsonl(&pm.path_filtered()).unwrap();
    let bidix: Vec<BidixEntry> = read_jsonl(&pm.path_bidix()).unwrap();
    let monodix: Vec<MonodixEntry> = read_jsonl(&pm.path_monodix()).unwrap();

    // multi-sense preservation: abasar keeps both numbered senses and
    // expands to two surface entries
    let abasar = find_entry(&entries, "abasar", Pos::Verb);
    assert_eq!(abasar.senses.len(), 2);
    assert_eq!(abasar.morphology, Some(Paradigm::ArVblex));
    let abasar_surfaces: Vec<&BidixEntry> =
        bidix.iter().filter(|b| b.lemma == "abasar").collect();
    assert_eq!(abasar_surfaces.len(), 2);
    assert_eq!(abasar_surfaces[0].translation, "madaldama");
    assert_eq!(abasar_surfaces[1].translation, "malaltigi");
    for surface in abasar_surfaces {
        assert_eq!(surface.paradigm, Paradigm::ArVblex);
        assert_eq!(surface.translation_paradigm, Paradigm::ArVblex);
    }

    // multi-source dedup: the io-wiktionary and en-via attestations of
    // banko -> banko land on one entry and one surface entry
    let banko = find_entry(&entries, "banko", Pos::Noun);
    assert!(banko.provenance.contains(&Source::IoWiktionary));
    assert!(banko.provenance.contains(&Source::EnWiktionaryVia));
    let max_conf = banko
        .senses
        .iter()
        .flat_map(|s| &s.translations)
        .filter(|t| t.term == "banko")
        .map(|t| t.confidence)
        .fold(0.0, f64::max);
    assert_eq!(max_conf, 1.0);
    let banko_surfaces: Vec<&BidixEntry> =
        bidix.iter().filter(|b| b.lemma == "banko").collect();
    assert_eq!(banko_surfaces.len(), 1);
    assert!(banko_surfaces[0].sources.contains(&Source::IoWiktionary));
    assert!(banko_surfaces[0].sources.contains(&Source::EnWiktionaryVia));

    // POS conflict preserved, not merged: stulo noun and Stulo place
    let stulo = find_entry(&entries, "stulo", Pos::Noun);
    let stulo_proper = find_entry(&entries, "Stulo", Pos::ProperNoun);
    assert_eq!(stulo_proper.morphology, Some(Paradigm::NpNp));
    let conflicts = fs::read_to_string(pm.path_report_conflicts()).unwrap();
    assert!(conflicts.contains("stulo (io): noun / proper-noun"));

    // via-meaning precision: the same-block pair carries the French gloss,
    // the cross-block pair does not exist
    let fr_sense = stulo
        .senses
        .iter()
        .find(|s| s.gloss.as_deref() == Some("Siège avec dossier"))
        .expect("no fr meaning sense on stulo");
    assert_eq!(fr_sense.translations[0].term, "seĝo");
    assert_eq!(fr_sense.translations[0].confidence, 0.7);
    assert!(
        fr_sense.translations[0]
            .sources
            .contains(&Source::FrWiktionaryMeaning)
    );
    assert!(!bidix.iter().any(|b| b.lemma == "tablo"));

    // the eo-wiktionary evidence arrived through the aligner
    assert!(stulo.provenance.contains(&Source::EoWiktionary));

    // frequency gate: in-window noun kept, organization proper noun kept,
    // out-of-window wikipedia-only noun dropped
    let acensilo = find_entry(&entries, "acensilo", Pos::Noun);
    assert_eq!(acensilo.morphology, Some(Paradigm::ONoun));
    let abdulino = find_entry(&entries, "Abdulino", Pos::ProperNoun);
    assert_eq!(abdulino.morphology, Some(Paradigm::NpNp));
    assert!(!entries.iter().any(|e| e.lemma.eq_ignore_ascii_case("rarajo")));

    // langlink translations reached the bidix
    assert!(
        bidix
            .iter()
            .any(|b| b.lemma == "acensilo" && b.translation == "lifto")
    );
    assert!(
        bidix
            .iter()
            .any(|b| b.lemma == "Abdulino" && b.translation == "Abdulino")
    );

    // the monodix covers entries with and without translations
    assert!(monodix.iter().any(|m| m.lemma == "Stulo" && m.pos == Pos::ProperNoun));
    assert!(monodix.iter().any(|m| m.lemma == "abasar"));

    // paradigm closure: nothing outside the enum reaches the output, and
    // every entry carries one
    for entry in &entries {
        assert!(entry.morphology.is_some(), "{} has no paradigm", entry.lemma);
    }
}

#[test]
fn resumability_and_determinism() {
    let dir = tempfile::tempdir().unwrap();
    let (pm, opts) = setup(dir.path());
    run_once(&pm, &opts);

    let bidix_first = fs::read(pm.path_bidix()).unwrap();
    let monodix_first = fs::read(pm.path_monodix()).unwrap();

    // second run: every stage cache-skips, artifacts untouched
    run_once(&pm, &opts);
    let state = PipelineState::load(&pm.path_state()).unwrap();
    for (name, stage) in &state.stages {
        assert_eq!(
            stage.status,
            StageStatus::Skipped,
            "stage {name} reran on a warm cache"
        );
    }
    assert_eq!(fs::read(pm.path_bidix()).unwrap(), bidix_first);

    // resume from the middle: upstream stays skipped, downstream reruns,
    // artifacts stay byte-identical
    let mut resume_opts = opts.clone();
    resume_opts.from_stage = Some("morphology".to_string());
    run_once(&pm, &resume_opts);
    let state = PipelineState::load(&pm.path_state()).unwrap();
    assert_eq!(state.stages["merge"].status, StageStatus::Skipped);
    assert_eq!(state.stages["morphology"].status, StageStatus::Completed);
    assert_eq!(state.stages["filter"].status, StageStatus::Completed);
    assert_eq!(state.stages["bidix"].status, StageStatus::Completed);
    assert_eq!(fs::read(pm.path_bidix()).unwrap(), bidix_first);
    assert_eq!(fs::read(pm.path_monodix()).unwrap(), monodix_first);

    // identical inputs and configuration in a fresh root: byte-identical
    // outputs
    let dir2 = tempfile::tempdir().unwrap();
    let (pm2, opts2) = setup(dir2.path());
    run_once(&pm2, &opts2);
    assert_eq!(fs::read(pm2.path_bidix()).unwrap(), bidix_first);
    assert_eq!(fs::read(pm2.path_monodix()).unwrap(), monodix_first);
}

#[test]
fn force_reruns_everything() {
    let dir = tempfile::tempdir().unwrap();
    let (pm, opts) = setup(dir.path());
    run_once(&pm, &opts);

    let mut force_opts = opts.clone();
    force_opts.force = true;
    run_once(&pm, &force_opts);

    let state = PipelineState::load(&pm.path_state()).unwrap();
    for (name, stage) in &state.stages {
        assert_eq!(
            stage.status,
            StageStatus::Completed,
            "stage {name} did not rerun under --force"
        );
    }
}

#[test]
fn disabled_source_leaves_no_trace() {
    let dir = tempfile::tempdir().unwrap();
    let (pm, mut opts) = setup(dir.path());
    opts.disable_source = vec![Source::EnWiktionaryVia];
    run_once(&pm, &opts);

    let entries: Vec<Entry> = read_jsonl(&pm.path_filtered()).unwrap();
    for entry in &entries {
        assert!(!entry.provenance.contains(&Source::EnWiktionaryVia));
    }
    let bidix: Vec<BidixEntry> = read_jsonl(&pm.path_bidix()).unwrap();
    let banko = bidix.iter().find(|b| b.lemma == "banko").unwrap();
    assert!(!banko.sources.contains(&Source::EnWiktionaryVia));
}

#[test]
fn missing_dumps_skip_their_stages() {
    let dir = tempfile::tempdir().unwrap();
    let pm = PathManager::new(dir.path());
    pm.setup_dirs().unwrap();

    use ideo::lang::DumpLang;
    // only the Ido Wiktionary dump is present
    write_wiki_dump(
        &pm.path_wiktionary_dump(DumpLang::Io),
        &[(
            1,
            "hundo",
            "== Ido ==\n=== Substantivo ===\n* {{eo}}: {{t|eo|hundo}}\n",
        )],
    );

    let opts = options_for(dir.path());
    run_once(&pm, &opts);

    let state = PipelineState::load(&pm.path_state()).unwrap();
    assert_eq!(state.stages["io-wiktionary"].status, StageStatus::Completed);
    assert_eq!(state.stages["eo-wiktionary"].status, StageStatus::Skipped);
    assert_eq!(state.stages["langlinks"].status, StageStatus::Skipped);
    assert_eq!(state.stages["bidix"].status, StageStatus::Completed);

    let bidix: Vec<BidixEntry> = read_jsonl(&pm.path_bidix()).unwrap();
    assert_eq!(bidix.len(), 1);
    assert_eq!(bidix[0].lemma, "hundo");
    assert_eq!(bidix[0].translation, "hundo");
}

#[test]
fn failed_stage_resumes_where_it_stopped() {
    let dir = tempfile::tempdir().unwrap();
    let (pm, opts) = setup(dir.path());

    // corrupt one dump so its stage fails mid-pipeline
    fs::write(pm.path_wiktionary_dump(ideo::lang::DumpLang::Eo), b"junk").unwrap();

    let cfg = SourceConfig::from_options(&opts);
    let stages = build_stages(&pm);
    let ctx = StageCtx {
        pm: &pm,
        cfg: &cfg,
        opts: &opts,
    };
    let err = run_pipeline(&ctx, &stages, false, None).unwrap_err();
    assert!(format!("{err:#}").contains("eo-wiktionary"));

    let state = PipelineState::load(&pm.path_state()).unwrap();
    assert_eq!(state.stages["io-wiktionary"].status, StageStatus::Completed);
    assert_eq!(state.stages["eo-wiktionary"].status, StageStatus::Failed);
    assert!(state.stages["eo-wiktionary"].error.is_some());
    // nothing downstream ran
    assert!(!state.stages.contains_key("merge"));

    // repair the dump; the rerun finishes from the failed stage on
    write_wiki_dump(
        &pm.path_wiktionary_dump(ideo::lang::DumpLang::Eo),
        &[(
            1,
            "seĝo",
            "== Esperanto ==\n=== Substantivo ===\n* {{io}}: stulo\n",
        )],
    );
    run_once(&pm, &opts);
    let state = PipelineState::load(&pm.path_state()).unwrap();
    assert_eq!(state.stages["io-wiktionary"].status, StageStatus::Skipped);
    assert_eq!(state.stages["eo-wiktionary"].status, StageStatus::Completed);
    assert_eq!(state.stages["bidix"].status, StageStatus::Completed);
}

//! Export and import commands
//!
//! Export failures halt their own operation and report to the caller;
//! the composition in memory is never touched.

use std::fs;

use colored::*;

use songsmith_core::export::{document, midi};
use songsmith_core::PartId;

use crate::commands::{CommandContext, CommandResult};

/// Handle `export json <path>`
pub fn cmd_export_json(args: &str, ctx: &mut CommandContext) -> CommandResult {
    if args.is_empty() {
        return CommandResult::Error("Usage: export json <path>".to_string());
    }
    let Some(generation) = &ctx.generation else {
        return CommandResult::Error("Nothing to export - run 'generate' first".to_string());
    };

    let json = match document::export(&generation.composition) {
        Ok(json) => json,
        Err(e) => return CommandResult::Error(format!("Export failed: {}", e)),
    };
    if let Err(e) = fs::write(args, &json) {
        return CommandResult::Error(format!("Could not write {}: {}", args, e));
    }
    CommandResult::Message(
        format!("Wrote {} ({} bytes)", args, json.len())
            .bright_green()
            .to_string(),
    )
}

/// Handle `import json <path>`: load a previously exported document and
/// adopt its parameters as the session's.
pub fn cmd_import_json(args: &str, ctx: &mut CommandContext) -> CommandResult {
    if args.is_empty() {
        return CommandResult::Error("Usage: import json <path>".to_string());
    }
    let text = match fs::read_to_string(args) {
        Ok(text) => text,
        Err(e) => return CommandResult::Error(format!("Could not read {}: {}", args, e)),
    };
    let composition = match document::import(&text) {
        Ok(composition) => composition,
        Err(e) => return CommandResult::Error(format!("Import failed: {}", e)),
    };

    let title = composition.params.title.clone();
    let sections = composition.sections.len();
    ctx.params = composition.params.clone();
    ctx.conductor
        .set_score(composition.flatten(), composition.params.tempo);
    ctx.generation = Some(songsmith_core::Generation {
        composition,
        log: vec![format!("imported from {}", args)],
    });

    CommandResult::Message(
        format!("Imported \"{}\" ({} sections)", title, sections)
            .bright_green()
            .to_string(),
    )
}

/// Handle `export midi [parts] <path>`. Parts default to all five; a
/// comma-separated list restricts the tracks (`export midi bass,drums
/// out.mid`).
pub fn cmd_export_midi(args: &str, ctx: &mut CommandContext) -> CommandResult {
    let words: Vec<&str> = args.split_whitespace().collect();
    let (parts, path) = match words.as_slice() {
        [path] => (PartId::ALL.to_vec(), *path),
        [parts, path] => {
            let mut selected = Vec::new();
            for name in parts.split(',') {
                match PartId::from_name(name) {
                    Some(part) => selected.push(part),
                    None => {
                        return CommandResult::Error(format!(
                            "Unknown part '{}' (melody, bass, guitar, piano, drums)",
                            name
                        ));
                    }
                }
            }
            (selected, *path)
        }
        _ => return CommandResult::Error("Usage: export midi [parts] <path>".to_string()),
    };

    let Some(generation) = &ctx.generation else {
        return CommandResult::Error("Nothing to export - run 'generate' first".to_string());
    };

    let bytes = match midi::export(&generation.composition, &parts) {
        Ok(bytes) => bytes,
        Err(e) => return CommandResult::Error(format!("Export failed: {}", e)),
    };
    if let Err(e) = fs::write(path, &bytes) {
        return CommandResult::Error(format!("Could not write {}: {}", path, e));
    }

    let names: Vec<&str> = parts.iter().map(|p| p.name()).collect();
    CommandResult::Message(
        format!(
            "Wrote {} ({} bytes, tracks: {})",
            path,
            bytes.len(),
            names.join(", ")
        )
        .bright_green()
        .to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::song::cmd_generate;
    use crate::commands::test_context;

    #[test]
    fn test_json_round_trip_through_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("song.json");
        let path = path.to_str().unwrap();

        let mut ctx = test_context();
        ctx.lyric_lines.push("cat".to_string());
        ctx.lyric_lines.push("hat".to_string());
        cmd_generate("Round Trip", &mut ctx);
        let original = ctx.generation.as_ref().unwrap().composition.clone();

        assert!(matches!(
            cmd_export_json(path, &mut ctx),
            CommandResult::Message(_)
        ));
        ctx.generation = None;
        assert!(matches!(
            cmd_import_json(path, &mut ctx),
            CommandResult::Message(_)
        ));
        assert_eq!(ctx.generation.unwrap().composition, original);
    }

    #[test]
    fn test_midi_export_writes_a_note_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("song.mid");
        let path = path.to_str().unwrap();

        let mut ctx = test_context();
        cmd_generate("", &mut ctx);
        assert!(matches!(
            cmd_export_midi(&format!("bass,drums {}", path), &mut ctx),
            CommandResult::Message(_)
        ));
        let bytes = fs::read(path).unwrap();
        assert_eq!(&bytes[0..4], b"MThd");
    }

    #[test]
    fn test_export_without_generation_errors() {
        let mut ctx = test_context();
        assert!(matches!(
            cmd_export_json("/tmp/nope.json", &mut ctx),
            CommandResult::Error(_)
        ));
        assert!(matches!(
            cmd_export_midi("/tmp/nope.mid", &mut ctx),
            CommandResult::Error(_)
        ));
    }

    #[test]
    fn test_midi_export_rejects_unknown_parts() {
        let mut ctx = test_context();
        cmd_generate("", &mut ctx);
        assert!(matches!(
            cmd_export_midi("kazoo /tmp/out.mid", &mut ctx),
            CommandResult::Error(_)
        ));
    }

    #[test]
    fn test_import_surfaces_bad_documents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.json");
        fs::write(&path, "not a composition").unwrap();

        let mut ctx = test_context();
        let result = cmd_import_json(path.to_str().unwrap(), &mut ctx);
        assert!(matches!(result, CommandResult::Error(_)));
        assert!(ctx.generation.is_none(), "failed import must not corrupt state");
    }
}

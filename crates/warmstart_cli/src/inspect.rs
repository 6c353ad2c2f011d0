//! `warmstart inspect`: print an artifact header, optionally validated.

use serde_json::json;
use warmstart_cache::{validate, ArtifactHeader, Verdict};

use crate::session::{load_engine, read_artifact, read_source, CommandResult};
use crate::{GlobalArgs, InspectArgs, ReportFormat};

/// Runs the `warmstart inspect` command.
///
/// Exit code 1 if `--script` is given and the gate rejects the artifact.
pub fn run(args: &InspectArgs, global: &GlobalArgs) -> CommandResult {
    let artifact = read_artifact(&args.artifact)?;
    let header = artifact.header()?;

    let verdict = match &args.script {
        Some(path) => {
            let engine = load_engine(global)?;
            let source = read_source(path)?;
            Some(validate(&artifact, engine.identity(), &source))
        }
        None => None,
    };

    let report = match args.format {
        ReportFormat::Text => render_text(&header, artifact.len(), verdict),
        ReportFormat::Json => render_json(&header, artifact.len(), verdict)?,
    };
    println!("{report}");

    Ok(match verdict {
        Some(Verdict::Rejected(_)) => 1,
        _ => 0,
    })
}

fn verdict_label(verdict: Verdict) -> String {
    match verdict {
        Verdict::Accepted => "accepted".to_string(),
        Verdict::Rejected(reason) => format!("rejected: {reason}"),
    }
}

fn render_text(header: &ArtifactHeader, len: usize, verdict: Option<Verdict>) -> String {
    let mut lines = vec![
        format!("artifact bytes: {len}"),
        format!("format version: {}", header.format_version),
        format!("engine version: {}", header.engine_version),
        format!("flag hash:      {}", header.flag_hash),
        format!("source tag:     {}", header.source_tag),
        format!("source length:  {}", header.source_len),
        format!("payload length: {}", header.payload_len),
    ];
    if let Some(verdict) = verdict {
        lines.push(format!("verdict:        {}", verdict_label(verdict)));
    }
    lines.join("\n")
}

fn render_json(
    header: &ArtifactHeader,
    len: usize,
    verdict: Option<Verdict>,
) -> Result<String, serde_json::Error> {
    let mut value = json!({
        "artifact_len": len,
        "format_version": header.format_version,
        "engine_version": header.engine_version,
        "flag_hash": header.flag_hash.to_string(),
        "source_tag": header.source_tag.to_string(),
        "source_len": header.source_len,
        "payload_len": header.payload_len,
    });
    if let Some(verdict) = verdict {
        value["verdict"] = json!(verdict_label(verdict));
    }
    serde_json::to_string_pretty(&value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use warmstart_cache::RejectReason;
    use warmstart_common::ContentHash;

    fn header() -> ArtifactHeader {
        ArtifactHeader {
            format_version: 1,
            engine_version: "0.1.0".to_string(),
            flag_hash: ContentHash::from_bytes(b"flags"),
            source_tag: ContentHash::from_bytes(b"source"),
            source_len: 13,
            payload_len: 40,
        }
    }

    #[test]
    fn text_report_lists_fields() {
        let text = render_text(&header(), 120, None);
        assert!(text.contains("engine version: 0.1.0"));
        assert!(text.contains("source length:  13"));
        assert!(!text.contains("verdict"));
    }

    #[test]
    fn text_report_with_verdict() {
        let text = render_text(
            &header(),
            120,
            Some(Verdict::Rejected(RejectReason::SourceMismatch)),
        );
        assert!(text.ends_with("verdict:        rejected: source mismatch"));
    }

    #[test]
    fn json_report_is_parseable() {
        let json = render_json(&header(), 120, Some(Verdict::Accepted)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["artifact_len"], 120);
        assert_eq!(value["payload_len"], 40);
        assert_eq!(value["verdict"], "accepted");
        assert_eq!(
            value["flag_hash"],
            ContentHash::from_bytes(b"flags").to_string()
        );
    }

    #[test]
    fn garbage_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("junk.wscc");
        std::fs::write(&path, b"definitely not an artifact").unwrap();
        let args = InspectArgs {
            artifact: path,
            format: ReportFormat::Text,
            script: None,
        };
        let global = GlobalArgs {
            quiet: true,
            verbose: false,
            config: None,
        };
        let err = run(&args, &global).err().unwrap();
        assert!(err.to_string().contains("malformed"));
    }
}

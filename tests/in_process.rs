mod common;

use gzpipe::{FieldProjection, InProcessPipeline, OutputSink, PipelineError};

use common::{read_gz_lines, sample_events, sample_projected, write_gz_lines};

#[test]
fn projects_fields_in_input_order() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let input = dir.path().join("events.json.gz");
    let output = dir.path().join("projected.json.gz");
    write_gz_lines(&input, &sample_events())?;

    let pipeline = InProcessPipeline::new(FieldProjection::new("actor"))
        .with_output(OutputSink::File(output.clone()));
    assert!(pipeline.run(&input)?);

    assert_eq!(read_gz_lines(&output)?, sample_projected());
    Ok(())
}

#[test]
fn discard_sink_still_reports_success() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let input = dir.path().join("events.json.gz");
    write_gz_lines(&input, &sample_events())?;

    let pipeline = InProcessPipeline::new(FieldProjection::new("actor"));
    assert!(pipeline.run(&input)?);
    Ok(())
}

#[test]
fn malformed_record_fails_the_whole_run() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let input = dir.path().join("events.json.gz");
    let mut events = sample_events();
    events[1] = r#"{"actor":"#.to_string();
    write_gz_lines(&input, &events)?;

    let err = InProcessPipeline::new(FieldProjection::new("actor"))
        .run(&input)
        .unwrap_err();
    assert!(matches!(err, PipelineError::Transform { line: 2, .. }));
    Ok(())
}

#[test]
fn absent_projected_field_is_fatal() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let input = dir.path().join("events.json.gz");
    write_gz_lines(&input, &sample_events())?;

    let err = InProcessPipeline::new(FieldProjection::new("missing"))
        .run(&input)
        .unwrap_err();
    assert!(matches!(err, PipelineError::Transform { line: 1, .. }));
    Ok(())
}

#[test]
fn truncated_compressed_input_is_a_codec_error() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let input = dir.path().join("events.json.gz");
    write_gz_lines(&input, &common::bulk_events(2000))?;

    let bytes = std::fs::read(&input)?;
    std::fs::write(&input, &bytes[..bytes.len() / 2])?;

    let err = InProcessPipeline::new(FieldProjection::new("actor"))
        .run(&input)
        .unwrap_err();
    assert!(matches!(err, PipelineError::Codec(_)));
    Ok(())
}

#[test]
fn missing_input_file_is_a_codec_error() {
    let err = InProcessPipeline::new(FieldProjection::new("actor"))
        .run(std::path::Path::new("/nonexistent/events.json.gz"))
        .unwrap_err();
    assert!(matches!(err, PipelineError::Codec(_)));
}

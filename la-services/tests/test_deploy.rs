//! Checks on the shipped deployment files.

const DOCKERFILE: &str = include_str!("../../Dockerfile");

fn line_of(needle: &str) -> usize {
    DOCKERFILE
        .lines()
        .position(|l| l.trim_start().starts_with(needle))
        .unwrap_or_else(|| panic!("Dockerfile has no line starting with {needle}"))
}

#[test]
fn dockerfile_declares_volumes_after_init() {
    assert!(line_of("RUN life-assistant init") < line_of("VOLUME"));
}

#[test]
fn dockerfile_runs_the_bot() {
    assert!(DOCKERFILE.lines().last().unwrap().contains(r#"CMD ["life-assistant", "run"]"#));
}

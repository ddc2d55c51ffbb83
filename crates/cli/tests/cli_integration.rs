//! End-to-end tests for the navtree binary

mod common;

use anyhow::Result;
use common::{Workspace, INACTIVE_TAB_SCENARIO, TABS_SCENARIO};

#[test]
fn test_replay_prints_transitions_in_order() -> Result<()> {
    let ws = Workspace::new()?;
    let scenario = ws.write("tabs.toml", TABS_SCENARIO)?;

    let result = navtree!(ws.path(), "replay", &scenario).assert_success()?;

    let transitions: Vec<&str> = result
        .stdout
        .lines()
        .filter(|line| ["push", "pop", "change", "select"].iter().any(|verb| line.contains(verb)))
        .filter(|line| line.contains("(in "))
        .collect();
    assert_eq!(transitions.len(), 7, "stdout:\n{}", result.stdout);
    assert!(transitions[0].contains("change") && transitions[0].contains("search"));
    assert!(transitions[1].contains("article") && transitions[1].contains("(in home)"));
    assert!(transitions[2].contains("select") && transitions[2].contains("search"));
    assert!(transitions[3].contains("results") && transitions[3].contains("(in search)"));
    assert!(transitions[4].contains("select") && transitions[4].contains("home"));
    assert!(transitions[5].contains("pop") && transitions[5].contains("article"));
    assert!(transitions[6].contains("change") && transitions[6].contains("settings"));

    // The root binding counts as a transition but never reaches a view
    assert!(result.contains_stdout("8 steps, 8 transitions"));
    Ok(())
}

#[test]
fn test_replay_with_animation_delay() -> Result<()> {
    let ws = Workspace::new()?;
    let scenario = ws.write("tabs.toml", TABS_SCENARIO)?;

    let result = navtree!(ws.path(), "replay", &scenario, "--delay-ms", "20").assert_success()?;

    // Seven view transitions, each held for the delay, one at a time
    assert!(result.duration.as_millis() >= 140);
    assert!(result.contains_stdout("8 transitions"));
    Ok(())
}

#[test]
fn test_replay_times_out_on_stalled_view() -> Result<()> {
    let ws = Workspace::new()?;
    let scenario = ws.write("tabs.toml", TABS_SCENARIO)?;

    let result = navtree!(
        ws.path(),
        "replay",
        &scenario,
        "--stall",
        "article",
        "--timeout-ms",
        "100"
    )
    .assert_failure()?;

    assert!(result.contains_stderr("Step 2 (push article) failed"));
    assert!(result.contains_stderr("was not signalled"));
    // Nothing after the stalled push ran
    assert!(result.lines_with("results").is_empty());
    Ok(())
}

#[test]
fn test_replay_rejects_invalid_timeout() -> Result<()> {
    let ws = Workspace::new()?;
    let scenario = ws.write("tabs.toml", TABS_SCENARIO)?;

    let result = navtree!(ws.path(), "replay", &scenario, "--timeout-ms", "0").assert_failure()?;
    assert!(result.contains_stderr("completion_timeout_ms"));
    Ok(())
}

#[test]
fn test_replay_shows_trees() -> Result<()> {
    let ws = Workspace::new()?;
    let scenario = ws.write("tabs.toml", TABS_SCENARIO)?;

    let result = navtree!(ws.path(), "replay", &scenario, "--trees").assert_success()?;
    assert!(result.contains_stdout("* article"));
    assert!(result.contains_stdout("- search"));
    Ok(())
}

#[test]
fn test_diff_between_steps() -> Result<()> {
    let ws = Workspace::new()?;
    let scenario = ws.write("tabs.toml", TABS_SCENARIO)?;

    let result = navtree!(ws.path(), "diff", &scenario, "--from", "2", "--to", "3").assert_success()?;
    assert!(result.contains_stdout("select search"));
    assert_eq!(result.lines_with("(in tabs)").len(), 1);

    let result = navtree!(ws.path(), "diff", &scenario, "--from", "3", "--to", "3").assert_success()?;
    assert!(result.contains_stdout("No transitions"));
    Ok(())
}

#[test]
fn test_diff_step_out_of_range() -> Result<()> {
    let ws = Workspace::new()?;
    let scenario = ws.write("tabs.toml", TABS_SCENARIO)?;

    let result = navtree!(ws.path(), "diff", &scenario, "--to", "42").assert_failure()?;
    assert!(result.contains_stderr("Steps range from 0 to 7"));
    Ok(())
}

#[test]
fn test_invalid_scenario_reports_step() -> Result<()> {
    let ws = Workspace::new()?;
    let scenario = ws.write(
        "broken.toml",
        "root = \"stack\"\n[[steps]]\naction = \"select\"\nparent = \"stack\"\nchild = \"a\"\n\
         [[steps]]\naction = \"remove\"\ndestination = \"ghost\"\n",
    )?;

    let result = navtree!(ws.path(), "replay", &scenario).assert_failure()?;
    assert!(result.contains_stderr("Step 2 (remove ghost) is invalid"));
    Ok(())
}

#[test]
fn test_config_show() -> Result<()> {
    let ws = Workspace::new()?;

    let result = navtree!(ws.path(), "config", "show").assert_success()?;
    assert!(result.contains_stdout("completion_timeout_ms"));
    assert!(result.contains_stdout("5000"));

    let file = ws.write("navtree.toml", "[orchestrator]\ncompletion_timeout_ms = 750\n")?;
    let result = navtree!(ws.path(), "config", "show", "--file", &file).assert_success()?;
    assert!(result.contains_stdout("750"));
    Ok(())
}

#[test]
fn test_log_file() -> Result<()> {
    let ws = Workspace::new()?;
    let scenario = ws.write("tabs.toml", TABS_SCENARIO)?;
    let log = ws.path().join("logs").join("navtree.log");
    let log_arg = log.to_string_lossy().into_owned();

    navtree!(ws.path(), "-vv", "--log-file", &log_arg, "replay", &scenario).assert_success()?;

    let contents = std::fs::read_to_string(&log)?;
    assert!(contents.contains("Orchestrator started"));
    assert!(contents.contains("Replay finished: 8 transitions"));
    assert!(contents.contains("DEBUG"));
    Ok(())
}

#[test]
fn test_replay_reaches_inactive_tab_and_reselect() -> Result<()> {
    let ws = Workspace::new()?;
    let scenario = ws.write("inactive.toml", INACTIVE_TAB_SCENARIO)?;

    let result = navtree!(ws.path(), "replay", &scenario).assert_success()?;

    let in_search = result.lines_with("(in search)");
    assert_eq!(in_search.len(), 1, "stdout:\n{}", result.stdout);
    assert!(in_search[0].contains("push") && in_search[0].contains("results"));
    let in_results = result.lines_with("(in results)");
    assert_eq!(in_results.len(), 1);
    assert!(in_results[0].contains("detail"));
    let reselect = result.lines_with("reselect");
    assert_eq!(reselect.len(), 1);
    assert!(reselect[0].contains("search") && reselect[0].contains("(in window)"));
    Ok(())
}

#[test]
fn test_diff_knows_what_is_shown() -> Result<()> {
    let ws = Workspace::new()?;
    let scenario = ws.write("inactive.toml", INACTIVE_TAB_SCENARIO)?;

    // results was added while search was inactive; search itself has a view
    let result = navtree!(ws.path(), "diff", &scenario, "--from", "1", "--to", "2").assert_success()?;
    assert_eq!(result.lines_with("push results").len(), 1, "stdout:\n{}", result.stdout);
    assert!(result.contains_stdout("(in search)"));
    Ok(())
}

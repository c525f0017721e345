//! Static HTML report assembly.
//!
//! The report is the pipeline's only outward artifact: per-stage tuning
//! curves, ranked candidate tables, the final parameter set and the held-out
//! RMSE, plus a dump of the configuration that produced it.

pub mod plots;

use anyhow::{Context, Result};
use maud::{html, Markup, PreEscaped};
use plotly::Plot;

use crate::config::PipelineConfig;
use crate::pipeline::PipelineRun;
use crate::search::CandidateRow;

enum Block {
    Content(Markup),
    Plot(Plot),
}

/// One titled report section holding text blocks and plots in order.
pub struct ReportSection {
    title: String,
    blocks: Vec<Block>,
}

impl ReportSection {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            blocks: Vec::new(),
        }
    }

    pub fn add_content(&mut self, content: Markup) {
        self.blocks.push(Block::Content(content));
    }

    pub fn add_plot(&mut self, plot: Plot) {
        self.blocks.push(Block::Plot(plot));
    }
}

/// A multi-section HTML document with inline plotly figures.
pub struct Report {
    title: String,
    subtitle: String,
    sections: Vec<ReportSection>,
}

impl Report {
    pub fn new(title: &str, subtitle: &str) -> Self {
        Self {
            title: title.to_string(),
            subtitle: subtitle.to_string(),
            sections: Vec::new(),
        }
    }

    pub fn add_section(&mut self, section: ReportSection) {
        self.sections.push(section);
    }

    pub fn render(&self) -> String {
        let generated = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        let mut plot_id = 0usize;

        let body = html! {
            h1 { (self.title) }
            p class="subtitle" { (self.subtitle) " — generated " (generated) }
            @for section in &self.sections {
                section {
                    h2 { (section.title) }
                    @for block in &section.blocks {
                        @match block {
                            Block::Content(markup) => { (markup) }
                            Block::Plot(plot) => {
                                ({
                                    plot_id += 1;
                                    let id = format!("plot-{}", plot_id);
                                    PreEscaped(plot.to_inline_html(Some(&id)))
                                })
                            }
                        }
                    }
                }
            }
        };

        let page = html! {
            (maud::DOCTYPE)
            html {
                head {
                    meta charset="utf-8";
                    title { (self.title) }
                    script src="https://cdn.plot.ly/plotly-2.27.0.min.js" {}
                    style { (PreEscaped(STYLE)) }
                }
                body { (body) }
            }
        };
        page.into_string()
    }

    pub fn save_to_file(&self, path: &str) -> Result<()> {
        std::fs::write(path, self.render())
            .with_context(|| format!("Failed to write report to {}", path))
    }
}

const STYLE: &str = r#"
body { font-family: sans-serif; margin: 2em auto; max-width: 1100px; color: #222; }
h1 { border-bottom: 2px solid #ddd; padding-bottom: 0.3em; }
.subtitle { color: #666; }
table { border-collapse: collapse; margin: 1em 0; }
th, td { border: 1px solid #ccc; padding: 0.4em 0.8em; text-align: right; }
th { background: #f0f0f0; }
tr.winner { background: #eaf6ea; }
.code-container { background-color: #f5f5f5; padding: 10px; border-radius: 5px;
                  overflow-x: auto; font-family: monospace; white-space: pre-wrap; }
"#;

/// Table of ranked candidates for one stage; the winner row is highlighted.
pub fn ranked_table(rows: &[CandidateRow]) -> Markup {
    html! {
        table {
            tr {
                th { "Rank" }
                th { "Candidate" }
                th { "Best iteration" }
                th { "Mean valid RMSE" }
                th { "Std" }
                th { "Mean train RMSE" }
            }
            @for (rank, row) in rows.iter().enumerate() {
                tr class=[if rank == 0 { Some("winner") } else { None }] {
                    td { (rank + 1) }
                    td { (row.value) }
                    td { (row.best_iteration + 1) }
                    td { (format!("{:.5}", row.valid_mean)) }
                    td { (format!("{:.5}", row.valid_std)) }
                    td { (format!("{:.5}", row.train_mean)) }
                }
            }
        }
    }
}

/// Build the full tuning report for one pipeline run.
pub fn build_pipeline_report(run: &PipelineRun, config: &PipelineConfig) -> Result<Report> {
    let mut report = Report::new(
        "Gradient-boosted tree tuning",
        "Staged cross-validated grid search",
    );

    {
        let mut overview = ReportSection::new("Overview");
        overview.add_content(html! {
            p {
                "Tuned a gradient-boosted tree regressor on "
                (run.train_rows) " training rows (" (run.n_features)
                " feature columns), evaluated on " (run.test_rows)
                " held-out rows."
            }
            p {
                b { "Held-out RMSE: " (format!("{:.5}", run.final_test_rmse)) }
            }
            p {
                "Final parameters: " (run.final_params.trees) " trees, learning rate "
                (run.final_params.learning_rate) ", max depth "
                (run.final_params.max_depth) ", column subsample "
                (run.final_params.colsample) "."
            }
        });
        report.add_section(overview);
    }

    for (idx, stage) in run.stages.iter().enumerate() {
        let mut section = ReportSection::new(&format!("Stage {}: {}", idx + 1, stage.title));
        section.add_plot(plots::plot_stage_curves(
            &stage.outcome,
            &format!("{}: mean validation RMSE per candidate", stage.title),
        ));
        section.add_content(ranked_table(&stage.outcome.ranked));

        // Detail curve for the winning candidate.
        let winner_value = stage.outcome.winner().value;
        if let Some(curve) = stage
            .outcome
            .curves
            .iter()
            .find(|c| c.value == winner_value)
        {
            section.add_plot(plots::plot_train_valid_band(
                &curve.outcome,
                &format!("Winner ({}) train/validation curve", winner_value),
            ));
        }
        report.add_section(section);
    }

    {
        let mut section = ReportSection::new("Configuration");
        let json = serde_json::to_string_pretty(config)?;
        section.add_content(html! {
            div class="code-container" {
                pre { code { (json) } }
            }
        });
        report.add_section(section);
    }

    Ok(report)
}

//! Notebook rendering for completed tasks.
//!
//! Builds an nbformat-v4 notebook object out of the task transcript so the
//! caller gets a re-runnable record of what the agent did. The notebook is
//! saved into the sandbox at task completion and attached as an artifact.

use sandbox::{ExecutionArtifact, ExecutionResult};
use serde_json::{json, Map, Value};

/// Builder for an ordered list of notebook cells.
#[derive(Debug, Default)]
pub struct NotebookBuilder {
    cells: Vec<Value>,
    execution_count: u32,
}

impl NotebookBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self {
            cells: Vec::new(),
            execution_count: 0,
        }
    }

    /// Number of cells added so far.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether no cells have been added yet.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Add a markdown cell.
    pub fn add_markdown(&mut self, content: impl Into<String>) -> &mut Self {
        self.cells.push(json!({
            "cell_type": "markdown",
            "metadata": {},
            "source": content.into(),
        }));
        self
    }

    /// Add a code cell with an auto-incremented execution count.
    pub fn add_code(&mut self, content: impl Into<String>) -> &mut Self {
        self.execution_count += 1;
        self.cells.push(json!({
            "cell_type": "code",
            "execution_count": self.execution_count,
            "metadata": {},
            "outputs": [],
            "source": content.into(),
        }));
        self
    }

    /// Attach the outputs of an execution to the last code cell:
    /// one stream output per stdout/stderr line, one rich output per result,
    /// and an error output when the execution raised.
    ///
    /// Does nothing when the last cell is not a code cell.
    pub fn add_execution(&mut self, execution: &ExecutionResult) -> &mut Self {
        let execution_count = self.execution_count;
        let Some(outputs) = self.last_code_cell_outputs() else {
            return self;
        };

        for line in &execution.stdout {
            if !line.is_empty() {
                outputs.push(json!({
                    "output_type": "stream",
                    "name": "stdout",
                    "text": line,
                }));
            }
        }

        for line in &execution.stderr {
            if !line.is_empty() {
                outputs.push(json!({
                    "output_type": "stream",
                    "name": "stderr",
                    "text": line,
                }));
            }
        }

        for result in &execution.results {
            let data = artifact_mime_bundle(result);
            if data.is_empty() {
                continue;
            }
            if result.is_main_result {
                outputs.push(json!({
                    "output_type": "execute_result",
                    "execution_count": execution_count,
                    "data": data,
                    "metadata": {},
                }));
            } else {
                outputs.push(json!({
                    "output_type": "display_data",
                    "data": data,
                    "metadata": {},
                }));
            }
        }

        if let Some(error) = &execution.error {
            let traceback: Vec<&str> = error.traceback.split('\n').collect();
            outputs.push(json!({
                "output_type": "error",
                "ename": error.name,
                "evalue": error.value,
                "traceback": traceback,
            }));
        }

        self
    }

    /// Build the complete notebook structure.
    pub fn build(&self) -> Value {
        json!({
            "cells": self.cells,
            "metadata": {
                "kernelspec": {
                    "display_name": "Python 3",
                    "language": "python",
                    "name": "python3",
                },
                "language_info": {
                    "name": "python",
                    "version": "3.10.0",
                },
            },
            "nbformat": 4,
            "nbformat_minor": 5,
        })
    }

    fn last_code_cell_outputs(&mut self) -> Option<&mut Vec<Value>> {
        let last = self.cells.last_mut()?;
        if last["cell_type"] != "code" {
            return None;
        }
        last["outputs"].as_array_mut()
    }
}

/// Map an execution artifact's parts onto notebook MIME keys.
fn artifact_mime_bundle(artifact: &ExecutionArtifact) -> Map<String, Value> {
    let mut data = Map::new();
    if let Some(text) = &artifact.text {
        data.insert("text/plain".to_string(), json!(text));
    }
    if let Some(html) = &artifact.html {
        data.insert("text/html".to_string(), json!(html));
    }
    if let Some(markdown) = &artifact.markdown {
        data.insert("text/markdown".to_string(), json!(markdown));
    }
    if let Some(png) = &artifact.png {
        data.insert("image/png".to_string(), json!(png));
    }
    if let Some(svg) = &artifact.svg {
        data.insert("image/svg+xml".to_string(), json!(svg));
    }
    if let Some(json_part) = &artifact.json {
        data.insert("application/json".to_string(), json_part.clone());
    }
    data
}

//! Subcommand implementations.

use std::path::{Path, PathBuf};

use clesson_report::{
    json::JsonGenerator, LessonInput, ProgressGenerator, ProgressInput, ResultsGenerator,
    TestCaseInput, TestResultInput, ValidationInput,
};
use clesson_server::{Lesson, LessonId, ProgressReport, ValidateResponse};
use tracing::{info, warn};

use crate::client::ApiClient;
use crate::state::ClientState;
use crate::workspace::{self, Workspace};

/// Everything a command needs: the server, the persisted state, and how to
/// print.
pub struct Session {
    client: ApiClient,
    state: ClientState,
    state_path: PathBuf,
    json: bool,
}

impl Session {
    /// Creates a session.
    pub fn new(client: ApiClient, state: ClientState, state_path: PathBuf, json: bool) -> Self {
        Self {
            client,
            state,
            state_path,
            json,
        }
    }

    fn workspace(&self) -> Workspace {
        Workspace::new(&self.state.working_dir)
    }

    /// `clesson init`: creates the workspace root and checks the server.
    ///
    /// An unreachable server is reported but does not fail the command.
    pub async fn init(&self) -> anyhow::Result<()> {
        let workspace = self.workspace();
        workspace.init()?;

        let lessons = match self.client.health().await {
            Ok(health) => Some(health.lessons),
            Err(e) => {
                warn!(error = %e, "Server health check failed");
                None
            }
        };

        if self.json {
            print_json(&serde_json::json!({
                "workingDir": workspace.root(),
                "userId": self.state.user_id,
                "server": self.client.base_url(),
                "lessons": lessons,
            }))?;
        } else {
            println!("Initialized workspace at: {}", workspace.root().display());
            match lessons {
                Some(count) => println!("Server {} has {count} lessons", self.client.base_url()),
                None => println!("Server {} is not reachable yet", self.client.base_url()),
            }
            println!("Run 'clesson lesson --id 1' to start your first lesson");
        }
        Ok(())
    }

    /// `clesson lesson --id N`: fetches a lesson and prepares its workspace.
    pub async fn lesson(&mut self, id: LessonId) -> anyhow::Result<()> {
        let lesson = lesson_input(&self.client.lesson(id).await?);
        let materialized = self.workspace().materialize(&lesson)?;

        self.state.activate(id, &materialized.dir);
        self.state.save(&self.state_path)?;
        info!(lesson_id = id, dir = %materialized.dir.display(), "Activated lesson");

        if self.json {
            print_json(&lesson)?;
        } else {
            println!("Initialized Lesson {id}: {}", lesson.title);
            println!("Workspace: {}", materialized.dir.display());
            if !materialized.created_solution {
                println!("Kept your existing solution.c");
            }
            if !materialized.created_makefile {
                println!("Kept your existing Makefile");
            }
            println!("Edit solution.c and run 'clesson test' to check your solution");
        }
        Ok(())
    }

    /// `clesson next`: opens the lesson after the active one.
    pub async fn next(&mut self) -> anyhow::Result<()> {
        self.require_active()?;
        let next = self.state.last_lesson.checked_add(1).ok_or_else(|| {
            anyhow::anyhow!("No lesson after {}", self.state.last_lesson)
        })?;
        self.lesson(next).await
    }

    /// `clesson test`: grades the active lesson's `solution.c`.
    pub async fn test(&self) -> anyhow::Result<()> {
        let dir = self.require_active()?;
        let code = workspace::read_solution(dir)?;
        self.submit_code(self.state.last_lesson, &code).await
    }

    /// `clesson submit --id N --file PATH`: grades an arbitrary file.
    pub async fn submit(&self, id: LessonId, file: &Path) -> anyhow::Result<()> {
        let code = std::fs::read_to_string(file).map_err(|e| {
            anyhow::anyhow!(
                "Failed to read '{}': {e}\n\nSuggestion: Check the --file path",
                file.display()
            )
        })?;
        self.submit_code(id, &code).await
    }

    /// `clesson progress`: shows the learner's progress.
    pub async fn progress(&self) -> anyhow::Result<()> {
        let progress = progress_input(self.client.progress(&self.state.user_id).await?);

        if self.json {
            print_json(&progress)?;
        } else {
            print!("{}", ProgressGenerator::new(&progress).generate());
        }
        Ok(())
    }

    async fn submit_code(&self, id: LessonId, code: &str) -> anyhow::Result<()> {
        let response = self
            .client
            .validate(id, code, Some(&self.state.user_id))
            .await?;
        let validation = validation_input(response);
        info!(
            lesson_id = id,
            passed = validation.passed_count(),
            total = validation.test_results.len(),
            "Submission graded"
        );

        if self.json {
            print_json(&validation)?;
        } else {
            print!("{}", ResultsGenerator::new(id, &validation).generate());
        }
        Ok(())
    }

    fn require_active(&self) -> anyhow::Result<&Path> {
        self.state.active_dir().ok_or_else(|| {
            anyhow::anyhow!(
                "No active lesson\n\nSuggestion: Run 'clesson lesson --id <number>' first"
            )
        })
    }
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", JsonGenerator::new(value).generate_pretty()?);
    Ok(())
}

fn lesson_input(lesson: &Lesson) -> LessonInput {
    LessonInput {
        id: lesson.id,
        title: lesson.title.clone(),
        description: lesson.description.clone(),
        example_code: lesson.example_code.clone(),
        objectives: lesson.objectives.clone(),
        test_cases: lesson
            .test_cases
            .iter()
            .map(|case| TestCaseInput {
                input: case.input.clone(),
                expected_output: case.expected_output.clone(),
                description: case.description.clone(),
            })
            .collect(),
        prerequisites: lesson.prerequisites.iter().copied().collect(),
    }
}

fn validation_input(response: ValidateResponse) -> ValidationInput {
    ValidationInput {
        is_valid: response.is_valid,
        test_results: response
            .test_results
            .into_iter()
            .map(|verdict| TestResultInput {
                passed: verdict.passed,
                description: verdict.description,
                expected_output: verdict.expected_output,
                actual_output: verdict.actual_output,
                timed_out: verdict.timed_out,
                exit_code: verdict.exit_code,
            })
            .collect(),
        feedback: response.feedback,
        can_proceed: response.can_proceed,
    }
}

fn progress_input(report: ProgressReport) -> ProgressInput {
    ProgressInput {
        user_id: report.user_id,
        current_lesson: report.current_lesson,
        completed_lessons: report.completed_lessons,
        completion_percentage: report.completion_percentage,
        next_lesson: report.next_lesson,
    }
}

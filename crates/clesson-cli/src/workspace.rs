//! Lesson workspaces on the learner's machine.
//!
//! Each lesson gets `<root>/lesson<id>/` holding the learner's `solution.c`,
//! a `README.md` with the lesson instructions, and a `Makefile`. The solution
//! and Makefile are only written when missing so learner edits survive; the
//! README is rewritten every time.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clesson_report::{InstructionsGenerator, LessonInput};
use tracing::debug;

/// Learner source file name.
pub const SOLUTION_FILE: &str = "solution.c";

/// Instructions file name.
pub const README_FILE: &str = "README.md";

/// Build recipe file name.
pub const MAKEFILE: &str = "Makefile";

const MAKEFILE_CONTENTS: &str = "CC=gcc\nCFLAGS=-Wall -Werror\n\nsolution: solution.c\n\t$(CC) $(CFLAGS) -o $@ $<\n\n.PHONY: clean\nclean:\n\trm -f solution *.o *~\n";

/// Starter program for a lesson.
fn solution_scaffold(lesson_id: u32) -> String {
    format!(
        "#include <stdio.h>\n\nint main(void) {{\n    // Your solution for lesson {lesson_id} goes here\n    return 0;\n}}\n"
    )
}

/// What [`Workspace::materialize`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Materialized {
    /// The lesson directory.
    pub dir: PathBuf,
    /// Whether a new `solution.c` scaffold was written.
    pub created_solution: bool,
    /// Whether a new `Makefile` was written.
    pub created_makefile: bool,
}

/// Root directory holding all lesson workspaces.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    /// Creates a workspace rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory for `lesson_id`.
    pub fn lesson_dir(&self, lesson_id: u32) -> PathBuf {
        self.root.join(format!("lesson{lesson_id}"))
    }

    /// Creates the root directory.
    pub fn init(&self) -> anyhow::Result<()> {
        std::fs::create_dir_all(&self.root).with_context(|| {
            format!(
                "Failed to create workspace directory '{}'",
                self.root.display()
            )
        })
    }

    /// Writes the files for `lesson` into its directory.
    pub fn materialize(&self, lesson: &LessonInput) -> anyhow::Result<Materialized> {
        let dir = self.lesson_dir(lesson.id);
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create lesson directory '{}'", dir.display()))?;

        let created_solution = write_if_absent(&dir.join(SOLUTION_FILE), &solution_scaffold(lesson.id))?;

        let readme = InstructionsGenerator::new(lesson).generate();
        write_file(&dir.join(README_FILE), &readme)?;

        let created_makefile = write_if_absent(&dir.join(MAKEFILE), MAKEFILE_CONTENTS)?;

        debug!(
            lesson_id = lesson.id,
            dir = %dir.display(),
            created_solution,
            created_makefile,
            "Lesson workspace ready"
        );

        Ok(Materialized {
            dir,
            created_solution,
            created_makefile,
        })
    }
}

/// Reads the learner's solution from a lesson directory.
pub fn read_solution(dir: &Path) -> anyhow::Result<String> {
    let path = dir.join(SOLUTION_FILE);
    std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read solution '{}'", path.display()))
}

fn write_if_absent(path: &Path, contents: &str) -> anyhow::Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    write_file(path, contents)?;
    Ok(true)
}

fn write_file(path: &Path, contents: &str) -> anyhow::Result<()> {
    std::fs::write(path, contents).with_context(|| format!("Failed to write '{}'", path.display()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn lesson(id: u32, title: &str) -> LessonInput {
        LessonInput {
            id,
            title: title.to_string(),
            description: "Print something.".to_string(),
            ..LessonInput::default()
        }
    }

    #[test]
    fn test_materialize_creates_all_files() {
        let root = tempfile::tempdir().unwrap();
        let workspace = Workspace::new(root.path());

        let result = workspace.materialize(&lesson(1, "Hello")).unwrap();

        assert_eq!(result.dir, root.path().join("lesson1"));
        assert!(result.created_solution);
        assert!(result.created_makefile);
        let solution = std::fs::read_to_string(result.dir.join(SOLUTION_FILE)).unwrap();
        assert!(solution.contains("lesson 1"));
        let readme = std::fs::read_to_string(result.dir.join(README_FILE)).unwrap();
        assert!(readme.starts_with("# Lesson 1: Hello"));
        let makefile = std::fs::read_to_string(result.dir.join(MAKEFILE)).unwrap();
        assert!(makefile.contains("\t$(CC) $(CFLAGS) -o $@ $<"));
    }

    #[test]
    fn test_materialize_keeps_learner_work() {
        let root = tempfile::tempdir().unwrap();
        let workspace = Workspace::new(root.path());
        let dir = workspace.lesson_dir(2);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(SOLUTION_FILE), "my work").unwrap();
        std::fs::write(dir.join(MAKEFILE), "my recipe").unwrap();
        std::fs::write(dir.join(README_FILE), "stale").unwrap();

        let result = workspace.materialize(&lesson(2, "Variables")).unwrap();

        assert!(!result.created_solution);
        assert!(!result.created_makefile);
        assert_eq!(read_solution(&dir).unwrap(), "my work");
        assert_eq!(std::fs::read_to_string(dir.join(MAKEFILE)).unwrap(), "my recipe");
        let readme = std::fs::read_to_string(dir.join(README_FILE)).unwrap();
        assert!(readme.contains("Variables"));
    }

    #[test]
    fn test_init_creates_root() {
        let parent = tempfile::tempdir().unwrap();
        let workspace = Workspace::new(parent.path().join("c-learning"));
        workspace.init().unwrap();
        assert!(workspace.root().is_dir());
    }

    #[test]
    fn test_read_solution_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_solution(dir.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to read solution"));
    }
}

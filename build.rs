use vergen_gitcl::{Emitter, GitclBuilder};

// VERGEN_GIT_BRANCH and VERGEN_GIT_SHA feed the CLI's --version output.
fn main() -> anyhow::Result<()> {
    let git = GitclBuilder::default().branch(true).sha(true).build()?;
    Emitter::default().add_instructions(&git)?.emit()?;
    Ok(())
}

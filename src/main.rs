use anyhow::Result;

use songsmith::repl::Repl;

fn main() -> Result<()> {
    Repl::new()?.run()
}

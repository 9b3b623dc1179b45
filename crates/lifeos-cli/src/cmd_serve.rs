use lifeos_serve::{AppState, ServeConfig};

use crate::Ctx;

pub fn execute(ctx: Ctx, bind: &str, port: u16) -> anyhow::Result<()> {
    let config = ServeConfig {
        bind: bind.to_string(),
        port,
    };
    let state = AppState {
        backend: ctx.backend,
        default_workspace: ctx.workspace,
    };
    tokio::runtime::Runtime::new()?.block_on(lifeos_serve::serve(state, config))
}

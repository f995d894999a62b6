use super::context::{GraphicsContext, ShaderStage};
use super::error::{EngineError, Result};
use super::loader::SourceLoader;

/// Fetch both stage sources concurrently, compile them and link a program
///
/// Every failure is terminal for this call and leaves nothing allocated on the
/// context: a stage that failed is never handed back, the other stage is
/// released, and a program that failed to link is deleted.
pub async fn create_program<C, L>(
    ctx: &mut C,
    loader: &L,
    vertex_locator: &str,
    fragment_locator: &str,
) -> Result<C::Program>
where
    C: GraphicsContext,
    L: SourceLoader + ?Sized,
{
    let (vertex, fragment) =
        futures::join!(loader.load(vertex_locator), loader.load(fragment_locator));

    for (locator, response) in [(vertex_locator, &vertex), (fragment_locator, &fragment)] {
        if !response.is_success() {
            log::error!("Failed to load shader '{}': status {}", locator, response.status);
            return Err(EngineError::ShaderLoad {
                locator: locator.to_string(),
                status: response.status,
            });
        }
    }

    let vertex_shader = compile(ctx, ShaderStage::Vertex, &vertex.body)?;
    let fragment_shader = match compile(ctx, ShaderStage::Fragment, &fragment.body) {
        Ok(shader) => shader,
        Err(e) => {
            ctx.delete_shader(vertex_shader);
            return Err(e);
        }
    };

    let mut program = ctx.create_program();
    ctx.attach_shader(&mut program, &vertex_shader);
    ctx.attach_shader(&mut program, &fragment_shader);
    let linked = ctx.link_program(&mut program);

    ctx.delete_shader(vertex_shader);
    ctx.delete_shader(fragment_shader);

    match linked {
        Ok(()) => {
            log::info!("Linked shader program ({} + {})", vertex_locator, fragment_locator);
            Ok(program)
        }
        Err(diagnostic) => {
            log::error!("Program failed to link:\n{}", diagnostic);
            ctx.delete_program(program);
            Err(EngineError::ProgramLink { log: diagnostic })
        }
    }
}

/// The stage is passed in, so the diagnostic always names the right one
fn compile<C: GraphicsContext>(ctx: &mut C, stage: ShaderStage, source: &str) -> Result<C::Shader> {
    ctx.compile_shader(stage, source).map_err(|diagnostic| {
        log::error!("Failed to compile {} shader:\n{}", stage, diagnostic);
        EngineError::ShaderCompile { stage, log: diagnostic }
    })
}

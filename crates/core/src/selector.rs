//! Engine selection. Runs once per request, before any page is read.

use crate::config::AssemblyOptions;
use crate::engine::{Engine, ExternalToolEngine, InProcessEngine, RenderingEngine};
use iwb2pdf_types::EnginePreference;
use log::{debug, info, warn};

/// Picks the engine for one run.
///
/// - `ForceOn`: the external converter, or the in-process renderer with a
///   warning when the converter cannot be found.
/// - `ForceOff`: always the in-process renderer.
/// - `Auto`: the external converter when it is installed.
///
/// Never fails: a missing converter only changes the outcome.
pub fn select_engine(preference: EnginePreference, options: &AssemblyOptions) -> Engine {
    let engine = match preference {
        EnginePreference::ForceOff => {
            debug!("External converter disabled, using the in-process renderer");
            Engine::InProcess(InProcessEngine::from_options(options))
        }
        EnginePreference::ForceOn => {
            let external = ExternalToolEngine::from_options(options);
            if external.is_available() {
                Engine::ExternalTool(external)
            } else {
                warn!("External converter requested but not found, falling back to the in-process renderer");
                Engine::InProcess(InProcessEngine::from_options(options))
            }
        }
        EnginePreference::Auto => {
            let external = ExternalToolEngine::from_options(options);
            if external.is_available() {
                Engine::ExternalTool(external)
            } else {
                info!("No external converter found, using the in-process renderer");
                Engine::InProcess(InProcessEngine::from_options(options))
            }
        }
    };
    debug!("Selected the {} engine ({preference} requested)", engine.name());
    engine
}

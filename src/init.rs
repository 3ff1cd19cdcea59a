//! Lazy, ancestor-first, exactly-once static initialization.
//!
//! Triggers (instantiation, first access to a static field, first
//! invocation of a static method) call [`Engine::ensure_initialized`] with
//! the class obligated to be ready; for static members that is the
//! *declaring* class found by declared-type binding, not the name used at
//! the use site. The scheduler walks the ancestor chain root-first and runs
//! every pending initializer sequence before returning.

use log::{debug, warn};

use crate::classes::{InitState, InitStep};
use crate::diagnostics::RuntimeError;
use crate::interp::{Engine, Flow, Frame};
use crate::value;

impl Engine {
    /// Run every pending static initializer on `class`'s ancestor chain,
    /// root first, stopping after `class` itself.
    ///
    /// A class already `InProgress` is skipped: an initializer that
    /// transitively triggers its own class sees it as satisfied instead of
    /// deadlocking or re-running. A class that previously `Failed` faults
    /// every later trigger with `InitializationFailed`; there is no retry.
    pub fn ensure_initialized(&mut self, class: &str) -> Result<(), RuntimeError> {
        let chain = self.table().class(class)?.chain.clone();
        for name in chain {
            match self.table().class(&name)?.init_state {
                InitState::Done | InitState::InProgress => continue,
                InitState::Failed => {
                    return Err(RuntimeError::InitializationFailed { class: name });
                }
                InitState::Uninitialized => self.run_initializer(&name)?,
            }
        }
        Ok(())
    }

    fn run_initializer(&mut self, class: &str) -> Result<(), RuntimeError> {
        debug!("running static initializer sequence for '{class}'");
        self.table_mut().class_mut(class)?.init_state = InitState::InProgress;

        // A failed frame push must still land in the Failed state below,
        // or the class would stay InProgress and read as satisfied forever.
        let result = match self.push_frame_info(class, "static initializer") {
            Ok(()) => {
                let result = self.run_init_sequence(class);
                self.pop_frame_info();
                result
            }
            Err(fault) => Err(fault),
        };

        match result {
            Ok(()) => {
                self.table_mut().class_mut(class)?.init_state = InitState::Done;
                Ok(())
            }
            Err(fault) => {
                // The first trigger sees the original fault; the Failed
                // state answers every one after it.
                warn!("static initializer for '{class}' faulted: {fault}");
                self.table_mut().class_mut(class)?.init_state = InitState::Failed;
                Err(fault.at(class, "static initializer"))
            }
        }
    }

    fn run_init_sequence(&mut self, class: &str) -> Result<(), RuntimeError> {
        let steps = self.table().class(class)?.init_sequence.clone();
        let mut frame = Frame::new(class, "static initializer", None);
        for step in steps.iter() {
            match step {
                InitStep::Field { name, ty, value } => {
                    let value = self.eval_expr(value, &mut frame)?;
                    let value = value::coerce(self.table(), ty, value)?;
                    self.table_mut()
                        .class_mut(class)?
                        .static_storage
                        .insert(name.clone(), value);
                }
                InitStep::Block(body) => match self.exec_block(body, &mut frame)? {
                    // A return ends the block it appears in, nothing more.
                    Flow::Normal | Flow::Return(_) => {}
                    Flow::Break(label) => return Err(Engine::jump_fault("break", label)),
                    Flow::Continue(label) => {
                        return Err(Engine::jump_fault("continue", label));
                    }
                },
            }
        }
        Ok(())
    }
}

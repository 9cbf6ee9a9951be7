//! Circular dependency detection infrastructure.

use std::cell::RefCell;
use std::panic;

const MAX_DEPTH: usize = 1024;

/// Identity of one materialization in progress: the registration being
/// built and, for scoped services, the registry whose cache receives it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Frame {
    pub(crate) registration: usize,
    pub(crate) cache_owner: u64,
}

// Thread-local resolution state for circular dependency detection
thread_local! {
    static RESOLUTION_TLS: RefCell<ResolutionTls> = RefCell::new(ResolutionTls::default());
}

#[derive(Default)]
struct ResolutionTls {
    stack: Vec<(Frame, String)>,
}

/// Panic payload for circular dependency detection.
///
/// Carries the dependency path (service names) and the frame that closed the
/// cycle. The payload unwinds through every factory on the cycle and is turned
/// into [`DiError::Circular`](crate::DiError::Circular) by the resolve call
/// that first entered that frame.
#[derive(Debug)]
pub struct CircularPanic {
    /// The complete circular dependency path showing the cycle.
    pub path: Box<[String]>,
    origin: Frame,
}

/// Guard for managing thread-local resolution stack
pub(crate) struct StackGuard;

impl StackGuard {
    pub(crate) fn new(frame: Frame, name: &str) -> Self {
        RESOLUTION_TLS.with(|tls| {
            let mut tls = tls.borrow_mut();

            // Circular detection BEFORE pushing the new frame
            if tls.stack.iter().any(|(f, _)| *f == frame) {
                let mut path: Vec<String> = tls.stack.iter().map(|(_, n)| n.clone()).collect();
                path.push(name.to_string());
                // Trim the prefix that is not part of the cycle
                let start = tls.stack.iter().position(|(f, _)| *f == frame).unwrap_or(0);
                let path = path.split_off(start);
                drop(tls);
                panic::panic_any(CircularPanic {
                    path: path.into_boxed_slice(),
                    origin: frame,
                });
            }

            // Depth guard
            if tls.stack.len() >= MAX_DEPTH {
                let depth = tls.stack.len();
                drop(tls);
                panic::panic_any(crate::error::DiError::DepthExceeded(depth));
            }

            tls.stack.push((frame, name.to_string()));
        });

        Self
    }
}

impl Drop for StackGuard {
    fn drop(&mut self) {
        RESOLUTION_TLS.with(|tls| {
            tls.borrow_mut().stack.pop();
        });
    }
}

/// Execute a closure with circular dependency detection
pub(crate) fn with_circular_catch<T, F>(frame: Frame, name: &str, f: F) -> crate::error::DiResult<T>
where
    F: FnOnce() -> crate::error::DiResult<T>,
{
    use std::panic::AssertUnwindSafe;

    // Entering an open frame panics here, outside our own catch, so the
    // payload is handled by the frames below us on the stack.
    let _guard = StackGuard::new(frame, name);

    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => {
            if let Some(circular) = payload.downcast_ref::<CircularPanic>() {
                if circular.origin == frame {
                    return Err(crate::error::DiError::Circular(circular.path.to_vec()));
                }
            } else if let Some(depth) = payload.downcast_ref::<crate::error::DiError>() {
                return Err(depth.clone());
            }
            // Not ours: keep unwinding towards the frame that opened the cycle
            panic::resume_unwind(payload);
        }
    }
}

#[cfg(test)]
pub(crate) fn stack_depth() -> usize {
    RESOLUTION_TLS.with(|tls| tls.borrow().stack.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DiError;

    fn frame(id: usize) -> Frame {
        Frame { registration: id, cache_owner: 0 }
    }

    #[test]
    fn nested_distinct_frames_succeed_and_unwind_stack() {
        let result = with_circular_catch(frame(1), "a", || {
            with_circular_catch(frame(2), "b", || {
                assert_eq!(stack_depth(), 2);
                Ok(7)
            })
        });

        assert_eq!(result.unwrap(), 7);
        assert_eq!(stack_depth(), 0);
    }

    #[test]
    fn cycle_surfaces_at_opening_frame_even_if_swallowed() {
        let result: crate::error::DiResult<()> = with_circular_catch(frame(1), "a", || {
            // The middle frame ignores its inner result; the cycle must still reach "a".
            let _ = with_circular_catch(frame(2), "b", || {
                with_circular_catch(frame(1), "a", || Ok(()))
            });
            Ok(())
        });

        match result {
            Err(DiError::Circular(path)) => assert_eq!(path, vec!["a", "b", "a"]),
            other => panic!("expected circular error, got {:?}", other),
        }
        assert_eq!(stack_depth(), 0);
    }

    #[test]
    fn cycle_path_excludes_frames_outside_the_cycle() {
        let result: crate::error::DiResult<()> = with_circular_catch(frame(9), "root", || {
            with_circular_catch(frame(1), "a", || {
                with_circular_catch(frame(2), "b", || {
                    with_circular_catch(frame(1), "a", || Ok(()))
                })
            })
        });

        match result {
            Err(DiError::Circular(path)) => assert_eq!(path, vec!["a", "b", "a"]),
            other => panic!("expected circular error, got {:?}", other),
        }
    }
}

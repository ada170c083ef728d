// hook.rs — Function hook lifecycle.
//
// A hook redirects a fixed code address to a replacement routine and keeps a
// trampoline ("original") that runs the bytes the hook displaced. MinHook does
// the byte-level work; this module owns the bookkeeping:
//
//   create()     -> trampoline built, target untouched      (Created)
//   activate()   -> target now jumps into the replacement   (Active)
//   deactivate() -> target runs its own code again          (Deactivated)
//   release_all()-> every hook disabled and freed, backend shut down
//
// One hook per address, ever. Creating a second one on an address the table
// already knows about is an error.

use crate::error::{Error, Result};
use std::mem::size_of;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HookState {
    Created,
    Active,
    Deactivated,
}

/// Byte-level hooking engine.
pub trait HookBackend: Send {
    /// Build a trampoline for `target` redirecting to `detour`.
    /// Returns the address of the trampoline.
    unsafe fn create(&mut self, target: usize, detour: usize) -> Result<usize>;
    unsafe fn enable(&mut self, target: usize) -> Result<()>;
    unsafe fn disable(&mut self, target: usize) -> Result<()>;
    unsafe fn remove(&mut self, target: usize) -> Result<()>;
    /// Called once after every hook has been removed.
    unsafe fn shutdown(&mut self) {}
}

impl<B: HookBackend + ?Sized> HookBackend for Box<B> {
    unsafe fn create(&mut self, target: usize, detour: usize) -> Result<usize> {
        (**self).create(target, detour)
    }
    unsafe fn enable(&mut self, target: usize) -> Result<()> {
        (**self).enable(target)
    }
    unsafe fn disable(&mut self, target: usize) -> Result<()> {
        (**self).disable(target)
    }
    unsafe fn remove(&mut self, target: usize) -> Result<()> {
        (**self).remove(target)
    }
    unsafe fn shutdown(&mut self) {
        (**self).shutdown()
    }
}

/// Handle to one installed redirection. `F` is the `unsafe extern "C" fn`
/// type of the hooked routine; the replacement must have the same signature
/// and calling convention. That precondition is not checked at runtime.
#[derive(Clone, Copy, Debug)]
pub struct FunctionHook<F: Copy> {
    address: usize,
    original: F,
}

impl<F: Copy> FunctionHook<F> {
    /// Absolute address of the hooked routine.
    pub fn address(&self) -> usize {
        self.address
    }

    /// Callable that runs the routine as it was before the hook.
    pub fn original(&self) -> F {
        self.original
    }
}

pub struct HookTable<B: HookBackend> {
    backend: B,
    hooks: Vec<(usize, HookState)>,
}

impl<B: HookBackend> HookTable<B> {
    pub fn new(backend: B) -> Self {
        Self { backend, hooks: Vec::new() }
    }

    pub fn state(&self, address: usize) -> Option<HookState> {
        self.hooks.iter().find(|(a, _)| *a == address).map(|(_, s)| *s)
    }

    fn set_state(&mut self, address: usize, state: HookState) {
        if let Some(entry) = self.hooks.iter_mut().find(|(a, _)| *a == address) {
            entry.1 = state;
        }
    }

    /// Prepare a hook without redirecting anything yet.
    ///
    /// # Safety
    /// `address` must be the entry of a routine whose signature and calling
    /// convention are exactly `F`, and `F` must be a function pointer type.
    pub unsafe fn create<F: Copy>(&mut self, address: usize, replacement: F) -> Result<FunctionHook<F>> {
        if size_of::<F>() != size_of::<usize>() {
            return Err(Error::NotAFunctionPointer(address));
        }
        if self.state(address).is_some() {
            return Err(Error::DuplicateHook(address));
        }

        let detour = std::mem::transmute_copy::<F, usize>(&replacement);
        let trampoline = self.backend.create(address, detour)?;
        self.hooks.push((address, HookState::Created));
        log::debug!("hook created at {:08X} (trampoline {:08X})", address, trampoline);

        Ok(FunctionHook {
            address,
            original: std::mem::transmute_copy::<usize, F>(&trampoline),
        })
    }

    /// Start redirecting calls to the replacement.
    pub unsafe fn activate<F: Copy>(&mut self, hook: &FunctionHook<F>) -> Result<()> {
        let address = hook.address;
        match self.state(address) {
            Some(HookState::Created | HookState::Deactivated) => {}
            actual => {
                return Err(Error::HookState {
                    address,
                    expected: HookState::Created,
                    actual: actual.unwrap_or(HookState::Deactivated),
                })
            }
        }
        self.backend.enable(address)?;
        self.set_state(address, HookState::Active);
        Ok(())
    }

    /// Restore the routine's own behaviour. The trampoline stays valid.
    pub unsafe fn deactivate<F: Copy>(&mut self, hook: &FunctionHook<F>) -> Result<()> {
        let address = hook.address;
        match self.state(address) {
            Some(HookState::Active) => {}
            actual => {
                return Err(Error::HookState {
                    address,
                    expected: HookState::Active,
                    actual: actual.unwrap_or(HookState::Deactivated),
                })
            }
        }
        self.backend.disable(address)?;
        self.set_state(address, HookState::Deactivated);
        Ok(())
    }

    /// Switch every active hook off, keeping trampolines. Used to back out
    /// of a partially activated set.
    pub unsafe fn deactivate_all(&mut self) {
        for i in 0..self.hooks.len() {
            let (address, state) = self.hooks[i];
            if state != HookState::Active {
                continue;
            }
            match self.backend.disable(address) {
                Ok(()) => self.hooks[i].1 = HookState::Deactivated,
                Err(e) => log::warn!("{}", e),
            }
        }
    }

    /// Disable and free every hook, then shut the backend down. Errors are
    /// logged and skipped so one stuck hook does not keep the others alive.
    pub unsafe fn release_all(&mut self) {
        for (address, state) in std::mem::take(&mut self.hooks) {
            if state == HookState::Active {
                if let Err(e) = self.backend.disable(address) {
                    log::warn!("{}", e);
                }
            }
            if let Err(e) = self.backend.remove(address) {
                log::warn!("{}", e);
            }
        }
        self.backend.shutdown();
    }
}

#[cfg(windows)]
pub use self::minhook::MinHook;

#[cfg(windows)]
mod minhook {
    use super::HookBackend;
    use crate::error::{Error, Result};
    use minhook_sys::{
        MH_CreateHook, MH_DisableHook, MH_EnableHook, MH_Initialize, MH_OK, MH_RemoveHook,
        MH_Uninitialize,
    };
    use std::ffi::c_void;
    use std::ptr;

    pub struct MinHook(());

    impl MinHook {
        /// Initialize the MinHook library.
        pub unsafe fn new() -> Result<Self> {
            let s = MH_Initialize();
            if s != MH_OK { return Err(Error::HookInit(s)); }
            Ok(Self(()))
        }
    }

    impl HookBackend for MinHook {
        unsafe fn create(&mut self, target: usize, detour: usize) -> Result<usize> {
            let mut original = ptr::null_mut::<c_void>();
            let s = MH_CreateHook(target as *mut c_void, detour as *mut c_void, &mut original);
            if s != MH_OK { return Err(Error::HookCreate { address: target, status: s }); }
            Ok(original as usize)
        }

        unsafe fn enable(&mut self, target: usize) -> Result<()> {
            let s = MH_EnableHook(target as *mut c_void);
            if s != MH_OK { return Err(Error::HookEnable { address: target, status: s }); }
            Ok(())
        }

        unsafe fn disable(&mut self, target: usize) -> Result<()> {
            let s = MH_DisableHook(target as *mut c_void);
            if s != MH_OK { return Err(Error::HookDisable { address: target, status: s }); }
            Ok(())
        }

        unsafe fn remove(&mut self, target: usize) -> Result<()> {
            let s = MH_RemoveHook(target as *mut c_void);
            if s != MH_OK { return Err(Error::HookRemove { address: target, status: s }); }
            Ok(())
        }

        unsafe fn shutdown(&mut self) {
            MH_Uninitialize();
        }
    }
}

#[cfg(test)]
pub mod fake {
    use super::HookBackend;
    use crate::error::{Error, Result};
    use std::collections::HashMap;

    /// Records calls instead of patching code. `create` hands back whatever
    /// function was registered as the "original" for the target.
    #[derive(Default)]
    pub struct FakeBackend {
        pub originals: HashMap<usize, usize>,
        pub enabled: Vec<usize>,
        pub calls: Vec<String>,
        pub fail_enable: Option<usize>,
        pub fail_remove: Option<usize>,
    }

    impl HookBackend for FakeBackend {
        unsafe fn create(&mut self, target: usize, _detour: usize) -> Result<usize> {
            self.calls.push(format!("create {target:X}"));
            self.originals
                .get(&target)
                .copied()
                .ok_or(Error::HookCreate { address: target, status: -1 })
        }

        unsafe fn enable(&mut self, target: usize) -> Result<()> {
            self.calls.push(format!("enable {target:X}"));
            if self.fail_enable == Some(target) {
                return Err(Error::HookEnable { address: target, status: -1 });
            }
            self.enabled.push(target);
            Ok(())
        }

        unsafe fn disable(&mut self, target: usize) -> Result<()> {
            self.calls.push(format!("disable {target:X}"));
            self.enabled.retain(|t| *t != target);
            Ok(())
        }

        unsafe fn remove(&mut self, target: usize) -> Result<()> {
            self.calls.push(format!("remove {target:X}"));
            if self.fail_remove == Some(target) {
                return Err(Error::HookRemove { address: target, status: -1 });
            }
            Ok(())
        }

        unsafe fn shutdown(&mut self) {
            self.calls.push("shutdown".into());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fake::FakeBackend;
    use super::*;

    type AddFn = unsafe extern "C" fn(i32, i32) -> i32;

    unsafe extern "C" fn original_add(a: i32, b: i32) -> i32 {
        a + b
    }

    unsafe extern "C" fn replacement_add(a: i32, b: i32) -> i32 {
        a * b
    }

    const TARGET: usize = 0x0064_AC80;

    fn table() -> HookTable<FakeBackend> {
        let mut backend = FakeBackend::default();
        backend.originals.insert(TARGET, original_add as AddFn as usize);
        HookTable::new(backend)
    }

    #[test]
    fn original_runs_pre_hook_code() {
        let mut t = table();
        let hook = unsafe { t.create(TARGET, replacement_add as AddFn) }.unwrap();
        assert_eq!(unsafe { (hook.original())(2, 3) }, 5);
        assert_eq!(hook.address(), TARGET);
    }

    #[test]
    fn lifecycle_transitions() {
        let mut t = table();
        let hook = unsafe { t.create(TARGET, replacement_add as AddFn) }.unwrap();
        assert_eq!(t.state(TARGET), Some(HookState::Created));

        unsafe { t.activate(&hook) }.unwrap();
        assert_eq!(t.state(TARGET), Some(HookState::Active));
        assert_eq!(t.backend.enabled, vec![TARGET]);

        unsafe { t.deactivate(&hook) }.unwrap();
        assert_eq!(t.state(TARGET), Some(HookState::Deactivated));
        assert!(t.backend.enabled.is_empty());

        // A deactivated hook can be switched back on.
        unsafe { t.activate(&hook) }.unwrap();
        assert_eq!(t.state(TARGET), Some(HookState::Active));
    }

    #[test]
    fn second_hook_on_same_address_is_rejected() {
        let mut t = table();
        let hook = unsafe { t.create(TARGET, replacement_add as AddFn) }.unwrap();
        unsafe { t.activate(&hook) }.unwrap();

        let err = unsafe { t.create(TARGET, replacement_add as AddFn) }.unwrap_err();
        assert!(matches!(err, Error::DuplicateHook(TARGET)));
    }

    #[test]
    fn double_activation_is_rejected() {
        let mut t = table();
        let hook = unsafe { t.create(TARGET, replacement_add as AddFn) }.unwrap();
        unsafe { t.activate(&hook) }.unwrap();
        assert!(matches!(
            unsafe { t.activate(&hook) },
            Err(Error::HookState { actual: HookState::Active, .. })
        ));
    }

    #[test]
    fn deactivating_inactive_hook_is_rejected() {
        let mut t = table();
        let hook = unsafe { t.create(TARGET, replacement_add as AddFn) }.unwrap();
        assert!(unsafe { t.deactivate(&hook) }.is_err());
    }

    #[test]
    fn non_pointer_replacement_is_rejected() {
        let mut t = table();
        let err = unsafe { t.create(TARGET, (1u64, 2u64)) }.unwrap_err();
        assert!(matches!(err, Error::NotAFunctionPointer(TARGET)));
        assert_eq!(t.state(TARGET), None);
    }

    #[test]
    fn backend_failure_leaves_no_record() {
        let mut t = HookTable::new(FakeBackend::default());
        assert!(unsafe { t.create(TARGET, replacement_add as AddFn) }.is_err());
        assert_eq!(t.state(TARGET), None);
    }

    #[test]
    fn deactivate_all_only_touches_active_hooks() {
        let mut t = table();
        let other = 0x0062_9CE0;
        t.backend.originals.insert(other, original_add as AddFn as usize);

        let a = unsafe { t.create(TARGET, replacement_add as AddFn) }.unwrap();
        let _b = unsafe { t.create(other, replacement_add as AddFn) }.unwrap();
        unsafe { t.activate(&a) }.unwrap();
        unsafe { t.deactivate_all() };

        assert_eq!(t.state(TARGET), Some(HookState::Deactivated));
        assert_eq!(t.state(other), Some(HookState::Created));
        assert!(!t.backend.calls.contains(&format!("disable {other:X}")));
    }

    #[test]
    fn release_all_disables_active_and_removes_everything() {
        let mut t = table();
        let other = 0x0064_AF80;
        t.backend.originals.insert(other, original_add as AddFn as usize);

        let a = unsafe { t.create(TARGET, replacement_add as AddFn) }.unwrap();
        let _b = unsafe { t.create(other, replacement_add as AddFn) }.unwrap();
        unsafe { t.activate(&a) }.unwrap();
        unsafe { t.release_all() };

        assert_eq!(t.state(TARGET), None);
        assert_eq!(
            t.backend.calls[3..],
            [
                format!("disable {TARGET:X}"),
                format!("remove {TARGET:X}"),
                format!("remove {other:X}"),
                "shutdown".to_string(),
            ]
        );
    }

    #[test]
    fn failed_remove_does_not_stop_release() {
        let mut t = table();
        let other = 0x0064_AF80;
        t.backend.originals.insert(other, original_add as AddFn as usize);
        t.backend.fail_remove = Some(TARGET);

        let a = unsafe { t.create(TARGET, replacement_add as AddFn) }.unwrap();
        let _b = unsafe { t.create(other, replacement_add as AddFn) }.unwrap();
        unsafe { t.activate(&a) }.unwrap();
        unsafe { t.release_all() };

        assert_eq!(t.state(TARGET), None);
        assert!(t.backend.enabled.is_empty());
        assert!(t.backend.calls.contains(&format!("remove {other:X}")));
        assert_eq!(t.backend.calls.last().map(String::as_str), Some("shutdown"));
    }
}

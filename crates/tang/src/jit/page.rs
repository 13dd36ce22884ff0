//! Executable page acquisition (§4.7, §4.8).
//!
//! The one genuinely unsafe operation the JIT backend needs outside the ABI bridge:
//! carving out a page of memory the OS will let the CPU execute. The specification
//! calls this out directly (§4.7/§9: "the executable-page acquisition step... is
//! host-specific and must use the host's memory-protection API; it is the one
//! genuinely unsafe operation"), so `libc` is pulled in here specifically for
//! `mmap`/`mprotect`/`munmap`, kept behind this module's narrow unsafe-FFI boundary.

use std::ptr::NonNull;

/// An mmap'd region holding freshly assembled machine code, made executable once
/// emission finishes. Dropped (and `munmap`'d) when the owning [`crate::program::Program`]
/// drops.
pub struct ExecutablePage {
    ptr: NonNull<u8>,
    len: usize,
}

// SAFETY: the page is read-only after `make_executable` and never mutated again;
// sharing an immutable executable region across threads is sound.
unsafe impl Send for ExecutablePage {}
unsafe impl Sync for ExecutablePage {}

impl ExecutablePage {
    /// Copies `code` into a fresh page, then flips it from RW to RX. Two-step
    /// because most hosts refuse a single `mmap` with both `PROT_WRITE` and
    /// `PROT_EXEC` (W^X), and because `mprotect`'s start address must be page-aligned
    /// regardless of where the `mmap` region happens to land.
    pub fn new(code: &[u8]) -> Result<Self, crate::error::TangError> {
        Self::with_relocations(code, &[])
    }

    /// Same as [`ExecutablePage::new`], but before the page is made executable,
    /// patches each `(site, data_offset)` relocation in `relocations` with the
    /// page's own final base address plus `data_offset` (§4.7: a `NativeBuilder`'s
    /// `load_data_ptr` can only record where a literal's bytes landed relative to
    /// the still-unmapped code buffer; the absolute address only exists once
    /// `mmap` has picked one). Each `site` must be the offset of an 8-byte
    /// little-endian immediate fully contained within `code`, as produced by
    /// `Assembler::mov_reg_imm64`.
    pub fn with_relocations(code: &[u8], relocations: &[(usize, usize)]) -> Result<Self, crate::error::TangError> {
        if code.is_empty() {
            return Err(crate::error::TangError::JitPageAllocation("cannot map an empty code buffer".to_string()));
        }
        let page_size = page_size();
        let len = code.len().div_ceil(page_size) * page_size;
        // SAFETY: requesting an anonymous private RW mapping; all arguments are
        // valid per `mmap(2)`, and we check the sentinel return below.
        let ptr = unsafe {
            libc::mmap(
                std::ptr::null_mut(),
                len,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
                -1,
                0,
            )
        };
        if ptr == libc::MAP_FAILED {
            return Err(crate::error::TangError::JitPageAllocation(std::io::Error::last_os_error().to_string()));
        }
        // SAFETY: `ptr` was just mapped RW for exactly `len` bytes; `code.len() <= len`.
        unsafe {
            std::ptr::copy_nonoverlapping(code.as_ptr(), ptr as *mut u8, code.len());
        }
        let base = ptr as usize;
        for &(site, data_offset) in relocations {
            debug_assert!(site + 8 <= code.len(), "relocation site out of bounds");
            let absolute = (base + data_offset) as u64;
            // SAFETY: `site` is within the `code.len()` bytes just copied into
            // this mapping, which is still writable (RW, not yet mprotect'd).
            unsafe {
                std::ptr::write_unaligned((ptr as *mut u8).add(site) as *mut u64, absolute);
            }
        }
        // SAFETY: `ptr`/`len` describe the mapping created above.
        let rc = unsafe { libc::mprotect(ptr, len, libc::PROT_READ | libc::PROT_EXEC) };
        if rc != 0 {
            // SAFETY: undoing the mapping made above on the error path.
            unsafe {
                libc::munmap(ptr, len);
            }
            return Err(crate::error::TangError::JitPageAllocation(std::io::Error::last_os_error().to_string()));
        }
        Ok(Self {
            ptr: NonNull::new(ptr as *mut u8).expect("mmap returned null without MAP_FAILED"),
            len,
        })
    }

    /// The page's base address, to be cast to a function pointer at a known byte
    /// offset once `Program` knows where each function's entry point landed.
    pub fn as_ptr(&self) -> *const u8 {
        self.ptr.as_ptr()
    }
}

impl Drop for ExecutablePage {
    fn drop(&mut self) {
        // SAFETY: `ptr`/`len` are exactly the mapping created in `new`, never
        // resized or partially unmapped elsewhere.
        unsafe {
            libc::munmap(self.ptr.as_ptr() as *mut libc::c_void, self.len);
        }
    }
}

impl std::fmt::Debug for ExecutablePage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutablePage").field("len", &self.len).finish()
    }
}

fn page_size() -> usize {
    // SAFETY: `sysconf` with `_SC_PAGESIZE` has no preconditions.
    let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if size > 0 {
        size as usize
    } else {
        4096
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_and_executes_a_ret_instruction() {
        // `0xC3` is `ret`; calling into it should return immediately without faulting.
        let page = ExecutablePage::new(&[0xC3]).expect("page allocation failed");
        let f: extern "C" fn() = unsafe { std::mem::transmute(page.as_ptr()) };
        f();
    }

    #[test]
    fn empty_code_is_rejected() {
        assert!(ExecutablePage::new(&[]).is_err());
    }

    #[test]
    fn relocation_site_is_patched_to_final_base_address() {
        // movabs rax, 0  (48 B8 + 8 zero bytes), then ret.
        let mut code = vec![0x48, 0xB8, 0, 0, 0, 0, 0, 0, 0, 0, 0xC3];
        code.push(0xAB); // one byte of "data" at offset 11
        let data_offset = 11;
        let page = ExecutablePage::with_relocations(&code, &[(2, data_offset)]).expect("page allocation failed");
        let base = page.as_ptr() as usize;
        let patched = unsafe { std::ptr::read_unaligned(page.as_ptr().add(2) as *const u64) };
        assert_eq!(patched, (base + data_offset) as u64);
    }
}

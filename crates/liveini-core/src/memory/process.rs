//! Target process discovery and handle ownership

use tracing::debug;

use crate::config::TargetConfig;
use crate::error::{Error, Result};

use super::region::RegionInfo;

#[cfg(target_os = "windows")]
use windows::Win32::Foundation::{BOOL, CloseHandle, HANDLE, HMODULE};

/// An opened target process and its main module
#[derive(Debug)]
pub struct ProcessHandle {
    #[cfg(target_os = "windows")]
    handle: HANDLE,
    pub pid: u32,
    pub base_address: u64,
    pub module_size: u32,
}

impl ProcessHandle {
    /// Locate the target, trying the executable name first and the window
    /// title second
    pub fn find(target: &TargetConfig) -> Result<Self> {
        match Self::find_and_open(&target.exe_name) {
            Ok(process) => Ok(process),
            Err(e) => {
                debug!("Lookup by executable name failed: {}", e);
                Self::find_by_window_title(&target.window_title)
            }
        }
    }
}

#[cfg(target_os = "windows")]
impl ProcessHandle {
    pub fn open(pid: u32) -> Result<Self> {
        use windows::Win32::System::Threading::{
            OpenProcess, PROCESS_QUERY_INFORMATION, PROCESS_VM_OPERATION, PROCESS_VM_READ,
            PROCESS_VM_WRITE,
        };

        // SAFETY: OpenProcess has no memory-safety preconditions; the returned
        // handle is owned by this struct and closed on drop.
        let handle = unsafe {
            OpenProcess(
                PROCESS_VM_READ | PROCESS_VM_WRITE | PROCESS_VM_OPERATION | PROCESS_QUERY_INFORMATION,
                BOOL::from(false),
                pid,
            )
        }
        .map_err(|e| Error::ProcessOpenFailed(format!("pid {}: {}", pid, e)))?;

        let mut process = Self {
            handle,
            pid,
            base_address: 0,
            module_size: 0,
        };
        let (base, size) = process.main_module()?;
        process.base_address = base;
        process.module_size = size;

        tracing::info!(
            "Attached to pid {} (base 0x{:X}, image size 0x{:X})",
            pid, base, size
        );
        Ok(process)
    }

    /// Open the first process whose executable name matches `exe_name`
    /// (case-insensitive)
    pub fn find_and_open(exe_name: &str) -> Result<Self> {
        use windows::Win32::System::Diagnostics::ToolHelp::{
            CreateToolhelp32Snapshot, PROCESSENTRY32W, Process32FirstW, Process32NextW,
            TH32CS_SNAPPROCESS,
        };

        // SAFETY: snapshot handle is closed below before returning.
        let snapshot = unsafe { CreateToolhelp32Snapshot(TH32CS_SNAPPROCESS, 0) }
            .map_err(|e| Error::ProcessNotFound(format!("process snapshot failed: {}", e)))?;

        let mut entry = PROCESSENTRY32W {
            dwSize: std::mem::size_of::<PROCESSENTRY32W>() as u32,
            ..Default::default()
        };

        let mut found = None;
        // SAFETY: entry.dwSize is initialized as the API requires.
        let mut more = unsafe { Process32FirstW(snapshot, &mut entry) }.is_ok();
        while more {
            let name = wide_to_string(&entry.szExeFile);
            if name.eq_ignore_ascii_case(exe_name) {
                found = Some(entry.th32ProcessID);
                break;
            }
            // SAFETY: same snapshot and entry as above.
            more = unsafe { Process32NextW(snapshot, &mut entry) }.is_ok();
        }

        // SAFETY: snapshot was returned by CreateToolhelp32Snapshot.
        let _ = unsafe { CloseHandle(snapshot) };

        let pid = found.ok_or_else(|| Error::ProcessNotFound(exe_name.to_string()))?;
        debug!("Found {} as pid {}", exe_name, pid);
        Self::open(pid)
    }

    /// Open the process owning the top-level window titled `title`
    pub fn find_by_window_title(title: &str) -> Result<Self> {
        use windows::Win32::UI::WindowsAndMessaging::{FindWindowW, GetWindowThreadProcessId};
        use windows::core::{HSTRING, PCWSTR};

        let title_w = HSTRING::from(title);
        // SAFETY: both strings are valid for the duration of the call.
        let hwnd = unsafe { FindWindowW(PCWSTR::null(), &title_w) }
            .map_err(|_| Error::ProcessNotFound(format!("window \"{}\"", title)))?;

        let mut pid = 0u32;
        // SAFETY: hwnd was just returned by FindWindowW; pid is a valid out pointer.
        unsafe { GetWindowThreadProcessId(hwnd, Some(&mut pid)) };
        if pid == 0 {
            return Err(Error::ProcessNotFound(format!("window \"{}\"", title)));
        }

        debug!("Window \"{}\" belongs to pid {}", title, pid);
        Self::open(pid)
    }

    /// Base address and image size of the first `.exe` module
    fn main_module(&self) -> Result<(u64, u32)> {
        use windows::Win32::System::ProcessStatus::{
            EnumProcessModules, GetModuleFileNameExW, GetModuleInformation, MODULEINFO,
        };

        let mut modules = [HMODULE::default(); 1024];
        let mut needed = 0u32;
        // SAFETY: the module array and byte count describe the same buffer.
        unsafe {
            EnumProcessModules(
                self.handle,
                modules.as_mut_ptr(),
                std::mem::size_of_val(&modules) as u32,
                &mut needed,
            )
        }
        .map_err(|e| Error::ProcessOpenFailed(format!("module enumeration failed: {}", e)))?;

        let count = (needed as usize / std::mem::size_of::<HMODULE>()).min(modules.len());
        for &module in &modules[..count] {
            let mut name = [0u16; 260];
            // SAFETY: name is a valid writable buffer.
            let len = unsafe { GetModuleFileNameExW(self.handle, module, &mut name) } as usize;
            let path = String::from_utf16_lossy(&name[..len.min(name.len())]);
            if !path.to_ascii_lowercase().ends_with(".exe") {
                continue;
            }

            let mut info = MODULEINFO::default();
            // SAFETY: info is a valid out pointer of the size passed.
            unsafe {
                GetModuleInformation(
                    self.handle,
                    module,
                    &mut info,
                    std::mem::size_of::<MODULEINFO>() as u32,
                )
            }
            .map_err(|e| Error::ProcessOpenFailed(format!("module info failed: {}", e)))?;

            debug!("Main module: {}", path);
            return Ok((info.lpBaseOfDll as u64, info.SizeOfImage));
        }

        Err(Error::ProcessOpenFailed(
            "no executable module found".to_string(),
        ))
    }

    pub(crate) fn read_into(&self, address: u64, buffer: &mut [u8]) -> Result<()> {
        use windows::Win32::System::Diagnostics::Debug::ReadProcessMemory;

        let mut read = 0usize;
        // SAFETY: buffer is a valid writable slice of the length passed; the
        // remote address is only dereferenced by the kernel.
        unsafe {
            ReadProcessMemory(
                self.handle,
                address as *const _,
                buffer.as_mut_ptr().cast(),
                buffer.len(),
                Some(&mut read),
            )
        }
        .map_err(|e| Error::read_failed(address, e.to_string()))?;

        if read != buffer.len() {
            return Err(Error::read_failed(
                address,
                format!("short read ({} of {} bytes)", read, buffer.len()),
            ));
        }
        Ok(())
    }

    pub(crate) fn write_from(&self, address: u64, bytes: &[u8]) -> Result<()> {
        use windows::Win32::System::Diagnostics::Debug::WriteProcessMemory;

        let mut written = 0usize;
        // SAFETY: bytes is a valid readable slice of the length passed.
        unsafe {
            WriteProcessMemory(
                self.handle,
                address as *const _,
                bytes.as_ptr().cast(),
                bytes.len(),
                Some(&mut written),
            )
        }
        .map_err(|e| Error::write_failed(address, e.to_string()))?;

        if written != bytes.len() {
            return Err(Error::write_failed(
                address,
                format!("short write ({} of {} bytes)", written, bytes.len()),
            ));
        }
        Ok(())
    }

    pub(crate) fn query(&self, address: u64) -> Option<RegionInfo> {
        use windows::Win32::System::Memory::{MEM_COMMIT, MEMORY_BASIC_INFORMATION, VirtualQueryEx};

        let mut mbi = MEMORY_BASIC_INFORMATION::default();
        // SAFETY: mbi is a valid out pointer of the size passed.
        let written = unsafe {
            VirtualQueryEx(
                self.handle,
                Some(address as *const _),
                &mut mbi,
                std::mem::size_of::<MEMORY_BASIC_INFORMATION>(),
            )
        };
        if written == 0 {
            return None;
        }

        Some(RegionInfo {
            base: mbi.BaseAddress as u64,
            size: mbi.RegionSize as u64,
            committed: mbi.State == MEM_COMMIT,
            protect: mbi.Protect.0,
        })
    }
}

#[cfg(target_os = "windows")]
impl Drop for ProcessHandle {
    fn drop(&mut self) {
        if !self.handle.is_invalid() {
            // SAFETY: handle was returned by OpenProcess and is closed once.
            let _ = unsafe { CloseHandle(self.handle) };
        }
    }
}

#[cfg(target_os = "windows")]
fn wide_to_string(wide: &[u16]) -> String {
    let end = wide.iter().position(|&c| c == 0).unwrap_or(wide.len());
    String::from_utf16_lossy(&wide[..end])
}

#[cfg(not(target_os = "windows"))]
impl ProcessHandle {
    pub fn open(pid: u32) -> Result<Self> {
        Err(Error::Unsupported(format!(
            "cannot attach to pid {}: process access requires Windows",
            pid
        )))
    }

    pub fn find_and_open(exe_name: &str) -> Result<Self> {
        Err(Error::Unsupported(format!(
            "cannot look up {}: process access requires Windows",
            exe_name
        )))
    }

    pub fn find_by_window_title(title: &str) -> Result<Self> {
        Err(Error::Unsupported(format!(
            "cannot look up window \"{}\": process access requires Windows",
            title
        )))
    }

    pub(crate) fn read_into(&self, address: u64, _buffer: &mut [u8]) -> Result<()> {
        Err(Error::read_failed(address, "unsupported platform"))
    }

    pub(crate) fn write_from(&self, address: u64, _bytes: &[u8]) -> Result<()> {
        Err(Error::write_failed(address, "unsupported platform"))
    }

    pub(crate) fn query(&self, _address: u64) -> Option<RegionInfo> {
        None
    }
}

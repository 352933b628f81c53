use std::io;
use std::path::Path;

/// Filesystem space in bytes, as reported by `df`.
pub(crate) struct DiskSpace {
    pub total: u64,
    pub used: u64,
}

/// Get disk space info via statvfs.
#[cfg(unix)]
#[allow(unsafe_code)]
pub(crate) fn get_disk_space(mount_path: &Path) -> io::Result<DiskSpace> {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;

    let c_path = CString::new(mount_path.as_os_str().as_bytes())
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    let mut stat: libc::statvfs = unsafe { std::mem::zeroed() };

    let ret = unsafe { libc::statvfs(c_path.as_ptr(), &raw mut stat) };
    if ret != 0 {
        return Err(io::Error::last_os_error());
    }

    let block_size = stat.f_frsize as u64;
    let total = stat.f_blocks as u64 * block_size;
    let free = stat.f_bfree as u64 * block_size;
    let used = total.saturating_sub(free);

    Ok(DiskSpace { total, used })
}

#[cfg(not(unix))]
pub(crate) fn get_disk_space(_mount_path: &Path) -> io::Result<DiskSpace> {
    Err(io::Error::new(io::ErrorKind::Unsupported, "statvfs is only available on unix"))
}

//! Current OS user lookup.
//!
//! The core creates one pipe per logged-in user, so the user name is part of
//! the endpoint. Lookup failures are reported as IO errors and become
//! connection errors at the transport layer.

use std::io;

/// Get the name of the user running this process.
///
/// # Platform Behavior
/// - **Windows**: `GetUserNameW`
/// - **Unix**: passwd entry of the real uid
pub fn current_username() -> io::Result<String> {
    #[cfg(windows)]
    {
        windows_username()
    }

    #[cfg(unix)]
    {
        unix_username()
    }

    #[cfg(not(any(unix, windows)))]
    {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "User lookup not implemented for this platform",
        ))
    }
}

#[cfg(unix)]
fn unix_username() -> io::Result<String> {
    use nix::unistd::{Uid, User};

    let uid = Uid::current();
    match User::from_uid(uid) {
        Ok(Some(user)) => Ok(user.name),
        Ok(None) => Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("No passwd entry for uid {}", uid),
        )),
        Err(errno) => Err(io::Error::from(errno)),
    }
}

#[cfg(windows)]
#[allow(unsafe_code)]
fn windows_username() -> io::Result<String> {
    use windows_sys::Win32::System::WindowsProgramming::GetUserNameW;

    // UNLEN + 1
    let mut buffer = [0u16; 257];
    let mut len = buffer.len() as u32;

    // SAFETY: `buffer` is valid for `len` UTF-16 units and `len` points to a live u32.
    let ok = unsafe { GetUserNameW(buffer.as_mut_ptr(), &mut len) };
    if ok == 0 {
        return Err(io::Error::last_os_error());
    }

    // `len` counts the terminating NUL
    let chars = (len as usize).saturating_sub(1).min(buffer.len());
    Ok(String::from_utf16_lossy(&buffer[..chars]))
}

//! Platform error strings for errno-convention return values.

/// Subset of the newlib errno table the embedded toolchain ships.
const ERRNO: &[(i64, &str, &str)] = &[
    (1, "EPERM", "Operation not permitted"),
    (2, "ENOENT", "No such file or directory"),
    (3, "ESRCH", "No such process"),
    (4, "EINTR", "Interrupted system call"),
    (5, "EIO", "Input/output error"),
    (6, "ENXIO", "No such device or address"),
    (7, "E2BIG", "Argument list too long"),
    (8, "ENOEXEC", "Exec format error"),
    (9, "EBADF", "Bad file descriptor"),
    (10, "ECHILD", "No child processes"),
    (11, "EAGAIN", "Resource temporarily unavailable"),
    (12, "ENOMEM", "Out of memory"),
    (13, "EACCES", "Permission denied"),
    (14, "EFAULT", "Bad address"),
    (16, "EBUSY", "Device or resource busy"),
    (17, "EEXIST", "File exists"),
    (19, "ENODEV", "No such device"),
    (21, "EISDIR", "Is a directory"),
    (22, "EINVAL", "Invalid argument"),
    (23, "ENFILE", "Too many open files in system"),
    (24, "EMFILE", "Too many open files"),
    (28, "ENOSPC", "No space left on device"),
    (30, "EROFS", "Read-only file system"),
    (32, "EPIPE", "Broken pipe"),
    (33, "EDOM", "Argument out of domain"),
    (34, "ERANGE", "Result out of range"),
    (110, "ETIMEDOUT", "Connection timed out"),
];

/// Human-readable description of a positive errno code.
pub fn message(code: i64) -> String {
    match ERRNO.iter().find(|(c, _, _)| *c == code) {
        Some((_, name, text)) => format!("{text} ({name})"),
        None => format!("unrecognised error code {code}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_and_unknown_codes() {
        assert_eq!(message(3), "No such process (ESRCH)");
        assert_eq!(message(22), "Invalid argument (EINVAL)");
        assert_eq!(message(9999), "unrecognised error code 9999");
    }
}

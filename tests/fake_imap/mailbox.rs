//! Account state behind the fake IMAP server
//!
//! ```ignore
//! let mailbox = MailboxBuilder::new()
//!     .password("secret")
//!     .folder("INBOX")
//!         .email(1, raw_rfc2822_bytes)
//!         .email(2, raw_rfc2822_bytes)
//!     .folder("Trash")
//!         .email(10, raw_rfc2822_bytes)
//!     .build();
//! ```
//!
//! The server keeps the `Mailbox` behind a mutex; STORE, EXPUNGE and
//! CLOSE mutate it, and tests read it back once a run has finished.

#[derive(Debug, Clone, Default)]
pub struct Mailbox {
    /// Password LOGIN must present. `None` accepts anything.
    pub password: Option<String>,
    pub folders: Vec<Folder>,
}

impl Mailbox {
    /// Case-sensitive, like a real server.
    pub fn get_folder(&self, name: &str) -> Option<&Folder> {
        self.folders.iter().find(|f| f.name == name)
    }

    pub fn get_folder_mut(&mut self, name: &str) -> Option<&mut Folder> {
        self.folders.iter_mut().find(|f| f.name == name)
    }

    /// UIDs still present in `name`, in storage order.
    pub fn uids(&self, name: &str) -> Vec<u32> {
        self.get_folder(name)
            .map(|f| f.emails.iter().map(|e| e.uid).collect())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone)]
pub struct Folder {
    pub name: String,
    /// Storage order, which is the order SEARCH reports. Not
    /// necessarily ascending by UID.
    pub emails: Vec<TestEmail>,
}

impl Folder {
    pub fn max_uid(&self) -> u32 {
        self.emails.iter().map(|e| e.uid).max().unwrap_or(0)
    }

    pub fn next_uid(&self) -> u32 {
        self.max_uid() + 1
    }

    /// Remove every `\Deleted` message. Returns the sequence numbers a
    /// client sees in `* N EXPUNGE`, each one counted after the
    /// removals announced before it.
    pub fn expunge(&mut self) -> Vec<usize> {
        let mut seqs = Vec::new();
        let mut seq = 1;
        self.emails.retain(|e| {
            if e.deleted {
                seqs.push(seq);
                false
            } else {
                seq += 1;
                true
            }
        });
        seqs
    }
}

#[derive(Debug, Clone)]
pub struct TestEmail {
    pub uid: u32,
    /// `\Deleted` is the only flag the fake server tracks.
    pub deleted: bool,
    /// Complete RFC 2822 message.
    pub raw: Vec<u8>,
}

pub struct MailboxBuilder {
    mailbox: Mailbox,
}

impl MailboxBuilder {
    pub fn new() -> Self {
        Self {
            mailbox: Mailbox::default(),
        }
    }

    /// Reject LOGIN unless it presents `password`.
    pub fn password(mut self, password: &str) -> Self {
        self.mailbox.password = Some(password.to_string());
        self
    }

    /// Start a folder; following `.email()` calls land in it.
    pub fn folder(mut self, name: &str) -> Self {
        self.mailbox.folders.push(Folder {
            name: name.to_string(),
            emails: Vec::new(),
        });
        self
    }

    /// # Panics
    ///
    /// Panics if no folder has been started yet.
    pub fn email(mut self, uid: u32, raw: &[u8]) -> Self {
        self.mailbox
            .folders
            .last_mut()
            .expect("call .folder() before .email()")
            .emails
            .push(TestEmail {
                uid,
                deleted: false,
                raw: raw.to_vec(),
            });
        self
    }

    pub fn build(self) -> Mailbox {
        self.mailbox
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn folder_with(uids: &[u32], deleted: &[u32]) -> Folder {
        Folder {
            name: "INBOX".into(),
            emails: uids
                .iter()
                .map(|&uid| TestEmail {
                    uid,
                    deleted: deleted.contains(&uid),
                    raw: Vec::new(),
                })
                .collect(),
        }
    }

    #[test]
    fn expunge_reports_shifting_sequence_numbers() {
        let mut folder = folder_with(&[1, 2, 3, 4], &[1, 3, 4]);
        assert_eq!(folder.expunge(), vec![1, 2, 2]);
        assert_eq!(folder.emails.len(), 1);
        assert_eq!(folder.emails[0].uid, 2);
    }

    #[test]
    fn expunge_without_deleted_is_empty() {
        let mut folder = folder_with(&[5, 6], &[]);
        assert!(folder.expunge().is_empty());
        assert_eq!(folder.emails.len(), 2);
    }

    #[test]
    fn next_uid_follows_highest_not_last() {
        assert_eq!(folder_with(&[10, 5], &[]).next_uid(), 11);
        assert_eq!(folder_with(&[], &[]).next_uid(), 1);
    }
}

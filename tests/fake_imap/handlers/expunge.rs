//! EXPUNGE: drops `\Deleted` messages from the selected folder and
//! announces each with `* N EXPUNGE`.

use super::selected_folder_mut;
use crate::fake_imap::mailbox::Mailbox;
use crate::fake_imap::reply::Reply;

pub fn handle_expunge(tag: &str, mailbox: &mut Mailbox, selected: Option<&str>) -> Reply {
    let folder = match selected_folder_mut(tag, mailbox, selected) {
        Ok(folder) => folder,
        Err(reply) => return reply,
    };

    folder
        .expunge()
        .into_iter()
        .fold(Reply::new(), |reply, seq| reply.untagged(&format!("{seq} EXPUNGE")))
        .ok(tag, "EXPUNGE completed")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake_imap::handlers::test_support::RAW;
    use crate::fake_imap::mailbox::MailboxBuilder;

    #[test]
    fn announces_each_removal() {
        let mut mailbox = MailboxBuilder::new()
            .folder("INBOX")
            .email(1, RAW)
            .email(2, RAW)
            .email(3, RAW)
            .build();
        let folder = mailbox.get_folder_mut("INBOX").unwrap();
        folder.emails[0].deleted = true;
        folder.emails[2].deleted = true;

        let reply = handle_expunge("A4", &mut mailbox, Some("INBOX"));

        assert_eq!(
            reply.text(),
            "* 1 EXPUNGE\r\n* 2 EXPUNGE\r\nA4 OK EXPUNGE completed\r\n"
        );
        assert_eq!(mailbox.uids("INBOX"), vec![2]);
    }

    #[test]
    fn nothing_flagged_leaves_folder_alone() {
        let mut mailbox = MailboxBuilder::new().folder("INBOX").email(1, RAW).build();

        let reply = handle_expunge("A4", &mut mailbox, Some("INBOX"));

        assert_eq!(reply.text(), "A4 OK EXPUNGE completed\r\n");
        assert_eq!(mailbox.uids("INBOX"), vec![1]);
    }

    #[test]
    fn needs_a_selected_folder() {
        let mut mailbox = MailboxBuilder::new().folder("INBOX").build();
        let reply = handle_expunge("A4", &mut mailbox, None);
        assert!(reply.text().starts_with("A4 BAD"));
    }
}

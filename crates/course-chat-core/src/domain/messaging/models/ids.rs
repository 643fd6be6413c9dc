// course-chat/course-chat-core
//
// Copyright: 2024, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use course_chat_utils::id_string;

id_string!(
    /// Server-assigned message identifier.
    MessageId
);
id_string!(
    /// Client-generated correlation identifier of a locally submitted message.
    TempId
);
id_string!(CourseId);
id_string!(UserId);

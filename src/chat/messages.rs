//! Fixed replies of the chat flow.

pub const CRITERIA_PROMPT: &str = "What are the specific criteria for the resorts you want me to find? (e.g., number of stars, location, amenities).";

pub const SCHEMA_INTRO: &str = "
I will capture the following critical data points for each resort:
<ul>
    <li>Resort Name</li>
    <li>Country</li>
    <li>Description</li>
    <li>Star Rating</li>
    <li>Price</li>
    <li>Main Picture (Image)</li>
</ul>
All data will be presented in a clean, organized table format.
I will now extract information for the first twenty resorts that match your criteria.
Once I've provided the first twenty resorts, you can type <b>CONTINUE</b> to get the next twenty. If you have finished, type <b>FINISH</b>.
";

pub const NO_MORE_AFTER_CONTINUE: &str = "No more resorts matching the criteria were found.";

pub const COMMAND_REMINDER: &str =
    "Please use CONTINUE to get more results or FINISH to complete the process.";

pub const CONSOLIDATING_BANNER: &str = "Consolidating all extracted data...<br>";

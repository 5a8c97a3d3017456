/// Prepended to the email body when asking the agent to classify it.
pub const CLASSIFY_EMAIL: &str = "Classify the following email and reply with a single digit only:\n\
1 if it is a reply to a job application that is qualifying or moving the candidate forward,\n\
0 if it is a rejection,\n\
2 if it is not a reply to a job application or only confirms that an application was received.\n\
Do not add any other text.\n\n";

pub const UPDATE_RESUME: &str = "Given the following job requirements, job description, and my resume in JSON format,please update the 'resume' section by incorporating relevant keywords from the 'job_description' and 'job_requirements' into the 'summary', 'projects description' and 'skills' sections. Ensure the updated resume is returned ONLY as a valid JSON object. Do not include any explanations, Markdown formatting, or code fences. The response must start with { and end with }\n\n";

pub const MATCH_SCORE: &str = "Match the job requirments and description with key words. return percentage of match that profile and job, and also return skills required for the job which are not present in resume i.e keywords. Just return percentage and skills in JSON format using the keys \"match_percentage\" and \"matched_skills\". Do not include any additional text or formatting outside the JSON.\n\n";

pub const PARSE_RESUME: &str =
    "Just follow instruction mentioned and don't add any '```json' or '```' in the response.\n";

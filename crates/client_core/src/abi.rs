//! Call and return types of the school records contract.

use alloy_sol_types::sol;

sol! {
    function addTeacher(address teacher) external;
    function addStudent(address student, uint256 id, string name) external;
    function assignGrade(address student, string subject, uint8 grade) external;

    function admin() external view returns (address admin);
    function teachers(address account) external view returns (bool registered);
    function getAllStudents() external view returns (address[] students);
    function getStudent(address student) external view returns (uint256 id, string name);
    function viewGrades(address student, string[] subjects) external view returns (uint8[] grades);
}

#[cfg(test)]
#[path = "tests/abi_tests.rs"]
mod tests;
